use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorPseudoClass {
    Checked,
    Disabled,
    Enabled,
    Required,
    Not(Vec<Vec<SelectorPart>>),
}

/// One compound selector: everything between two combinators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
    pub(crate) pseudo_classes: Vec<SelectorPseudoClass>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal
            && self.tag.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

/// Parse a comma-separated selector list in a single left-to-right pass.
/// Anything outside the supported grammar is an [`Error::UnsupportedSelector`].
pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    Scanner::new(selector).selector_list(false)
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(Error::UnsupportedSelector(self.src.into()))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    // A selector list ends at the closing paren of an enclosing `:not(...)`,
    // or at the end of input at the top level.
    fn selector_list(&mut self, nested: bool) -> Result<Vec<Vec<SelectorPart>>> {
        let mut groups = Vec::new();
        loop {
            groups.push(self.chain(nested)?);
            if self.peek() == Some(b',') {
                self.pos += 1;
                continue;
            }
            return Ok(groups);
        }
    }

    fn chain(&mut self, nested: bool) -> Result<Vec<SelectorPart>> {
        let mut parts: Vec<SelectorPart> = Vec::new();
        loop {
            self.skip_ws();
            let explicit = match self.peek() {
                Some(b'>') => Some(SelectorCombinator::Child),
                Some(b'+') => Some(SelectorCombinator::AdjacentSibling),
                Some(b'~') => Some(SelectorCombinator::GeneralSibling),
                _ => None,
            };
            if explicit.is_some() {
                self.pos += 1;
                self.skip_ws();
            }

            let at_end = match self.peek() {
                None | Some(b',') => true,
                Some(b')') => nested,
                _ => false,
            };
            if at_end {
                // A chain must not be empty or end on a dangling combinator.
                if parts.is_empty() || explicit.is_some() {
                    return self.fail();
                }
                return Ok(parts);
            }

            let step = self.compound()?;
            let combinator = if parts.is_empty() {
                if explicit.is_some() {
                    return self.fail();
                }
                None
            } else {
                Some(explicit.unwrap_or(SelectorCombinator::Descendant))
            };
            parts.push(SelectorPart { step, combinator });
        }
    }

    fn compound(&mut self) -> Result<SelectorStep> {
        let mut step = SelectorStep::default();
        let mut saw_simple = false;
        loop {
            match self.peek() {
                Some(b'*') => {
                    if saw_simple {
                        return self.fail();
                    }
                    step.universal = true;
                    self.pos += 1;
                }
                Some(b'#') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if step.id.replace(name).is_some() {
                        return self.fail();
                    }
                }
                Some(b'.') => {
                    self.pos += 1;
                    step.classes.push(self.ident()?);
                }
                Some(b'[') => {
                    self.pos += 1;
                    step.attrs.push(self.attr_condition()?);
                }
                Some(b':') => {
                    self.pos += 1;
                    step.pseudo_classes.push(self.pseudo_class()?);
                }
                Some(b) if is_ident_byte(b) => {
                    // A type selector is only valid at the front of a compound.
                    if saw_simple {
                        return self.fail();
                    }
                    step.tag = Some(self.ident()?);
                }
                _ => break,
            }
            saw_simple = true;
        }
        if !saw_simple {
            return self.fail();
        }
        Ok(step)
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if is_ident_byte(b)) {
            self.pos += 1;
        }
        if self.pos == start {
            return self.fail();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn pseudo_class(&mut self) -> Result<SelectorPseudoClass> {
        let name = self.ident()?;
        match name.as_str() {
            "checked" => Ok(SelectorPseudoClass::Checked),
            "disabled" => Ok(SelectorPseudoClass::Disabled),
            "enabled" => Ok(SelectorPseudoClass::Enabled),
            "required" => Ok(SelectorPseudoClass::Required),
            "not" => {
                if self.peek() != Some(b'(') {
                    return self.fail();
                }
                self.pos += 1;
                let inner = self.selector_list(true)?;
                if self.peek() != Some(b')') {
                    return self.fail();
                }
                self.pos += 1;
                Ok(SelectorPseudoClass::Not(inner))
            }
            _ => self.fail(),
        }
    }

    // Called with the opening '[' already consumed.
    fn attr_condition(&mut self) -> Result<SelectorAttrCondition> {
        self.skip_ws();
        let key = self.attr_name()?.to_ascii_lowercase();
        self.skip_ws();

        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(SelectorAttrCondition::Exists { key });
        }

        let build: fn(String, String) -> SelectorAttrCondition = match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                |key, value| SelectorAttrCondition::Eq { key, value }
            }
            Some(op @ (b'^' | b'$' | b'*' | b'~')) => {
                self.pos += 1;
                if self.peek() != Some(b'=') {
                    return self.fail();
                }
                self.pos += 1;
                match op {
                    b'^' => |key, value| SelectorAttrCondition::StartsWith { key, value },
                    b'$' => |key, value| SelectorAttrCondition::EndsWith { key, value },
                    b'*' => |key, value| SelectorAttrCondition::Contains { key, value },
                    _ => |key, value| SelectorAttrCondition::Includes { key, value },
                }
            }
            _ => return self.fail(),
        };

        self.skip_ws();
        let value = self.attr_value()?;
        self.skip_ws();
        if self.peek() != Some(b']') {
            return self.fail();
        }
        self.pos += 1;
        Ok(build(key, value))
    }

    fn attr_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if is_ident_byte(b) || b == b':') {
            self.pos += 1;
        }
        if self.pos == start {
            return self.fail();
        }
        Ok(&self.src[start..self.pos])
    }

    fn attr_value(&mut self) -> Result<String> {
        if let Some(quote @ (b'"' | b'\'')) = self.peek() {
            self.pos += 1;
            let start = self.pos;
            loop {
                match self.peek() {
                    None => return self.fail(),
                    Some(b'\\') => self.pos = (self.pos + 2).min(self.bytes.len()),
                    Some(b) if b == quote => {
                        let raw = self.src.get(start..self.pos).ok_or_else(|| {
                            Error::UnsupportedSelector(self.src.into())
                        })?;
                        self.pos += 1;
                        return Ok(strip_backslashes(raw));
                    }
                    Some(_) => self.pos += 1,
                }
            }
        }

        let start = self.pos;
        loop {
            match self.peek() {
                None => break,
                Some(b) if b.is_ascii_whitespace() || b == b']' => break,
                Some(b'\\') => self.pos = (self.pos + 2).min(self.bytes.len()),
                Some(_) => self.pos += 1,
            }
        }
        let raw = self
            .src
            .get(start..self.pos)
            .ok_or_else(|| Error::UnsupportedSelector(self.src.into()))?;
        Ok(strip_backslashes(raw))
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn strip_backslashes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}
