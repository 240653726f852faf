use super::*;
use crate::page::EventState;

pub(crate) const SUBMITTING_LABEL: &str =
    "<i class=\"fas fa-spinner fa-spin me-1\"></i>Procesando...";

pub(crate) const CONFIRM_DELETE_MESSAGE: &str =
    "\u{bf}Est\u{e1}s seguro de que deseas eliminar este elemento? Esta acci\u{f3}n no se puede deshacer.";

const FIELD_CONTAINER_SELECTOR: &str = ".form-group, .col-md-6, .mb-3";

/// One unit of scripted behavior. Listeners and timers hold these as data;
/// [`Page::run_action`] interprets them when the event or timer fires.
#[derive(Debug, Clone)]
pub(crate) enum Action {
    ToggleDateRange {
        select: NodeId,
        start_container: NodeId,
        end_container: NodeId,
    },
    PaintSwatch {
        select: NodeId,
        swatch: NodeId,
    },
    ClampNonNegative {
        input: NodeId,
    },
    GuardSubmit {
        form: NodeId,
    },
    ReleaseGuard {
        form: NodeId,
    },
    CloseModalSoon {
        form: NodeId,
    },
    HideModal {
        modal: NodeId,
    },
    CurrencyFocus {
        input: NodeId,
    },
    CurrencyBlur {
        input: NodeId,
    },
    ValidateForm {
        form: NodeId,
    },
    ConfirmDelete,
    RefreshMonthDisplays,
    DismissAlerts,
    ToggleSidebar {
        sidebar: NodeId,
    },
}

impl Page {
    pub(crate) fn run_action(
        &mut self,
        action: Action,
        _target: NodeId,
        state: &mut EventState,
    ) -> Result<()> {
        match action {
            Action::ToggleDateRange {
                select,
                start_container,
                end_container,
            } => {
                let display = if self.dom.value(select)? == "custom" {
                    "block"
                } else {
                    "none"
                };
                self.dom.style_set(start_container, "display", display)?;
                self.dom.style_set(end_container, "display", display)?;
            }
            Action::PaintSwatch { select, swatch } => {
                let color = self.dom.value(select)?;
                self.dom.style_set(swatch, "background-color", &color)?;
            }
            Action::ClampNonNegative { input } => {
                let value = self.dom.value(input)?;
                if parse_float_prefix(&value) < 0.0 {
                    self.dom.set_value(input, "0")?;
                }
            }
            Action::GuardSubmit { form } => {
                self.engage_guard(form)?;
            }
            Action::ReleaseGuard { form } => {
                // Fallback recovery; the timer that carries this action was
                // already consumed.
                self.release_guard(form, false)?;
            }
            Action::CloseModalSoon { form } => {
                if let Some(modal) = self.dom.closest(form, ".modal")? {
                    let id = self.set_timeout(Action::HideModal { modal }, MODAL_CLOSE_DELAY_MS);
                    self.widgets.pending_closes.push(id);
                }
            }
            Action::HideModal { modal } => {
                // Only a modal that was actually shown has an instance to hide.
                self.hide_modal_node(modal)?;
            }
            Action::CurrencyFocus { input } => {
                let stripped = sanitize_currency(&self.dom.value(input)?)?;
                self.dom.set_value(input, &stripped)?;
            }
            Action::CurrencyBlur { input } => {
                let stripped = sanitize_currency(&self.dom.value(input)?)?;
                if !stripped.is_empty() {
                    let formatted = format_two_decimals(parse_float_prefix(&stripped));
                    self.dom.set_value(input, &formatted)?;
                }
            }
            Action::ValidateForm { form } => {
                if !self.check_validity(form)? {
                    state.default_prevented = true;
                    state.propagation_stopped = true;
                }
                self.dom.class_add(form, "was-validated")?;
            }
            Action::ConfirmDelete => {
                if !self.confirm(CONFIRM_DELETE_MESSAGE) {
                    state.default_prevented = true;
                }
            }
            Action::RefreshMonthDisplays => {
                let label = month_year_label(CivilDate::from_unix_ms(self.now_ms()));
                for node in self.dom.query_selector_all(".current-month")? {
                    self.dom.set_text_content(node, &label)?;
                }
            }
            Action::DismissAlerts => {
                for alert in self.dom.query_selector_all(".alert:not(.alert-permanent)")? {
                    self.close_alert_node(alert)?;
                }
            }
            Action::ToggleSidebar { sidebar } => {
                self.dom.class_toggle(sidebar, "show")?;
            }
        }
        Ok(())
    }

    fn engage_guard(&mut self, form: NodeId) -> Result<()> {
        if self.guards.contains_key(&form) {
            return Ok(());
        }
        let Some(button) = self
            .dom
            .query_selector_from(form, "button[type=\"submit\"]")?
        else {
            return Ok(());
        };
        if self.dom.disabled(button) {
            return Ok(());
        }

        let original_label = self.dom.inner_html(button)?;
        self.dom.set_disabled(button, true)?;
        self.dom.set_inner_html(button, SUBMITTING_LABEL)?;
        let timer_id = self.set_timeout(
            Action::ReleaseGuard { form },
            SUBMIT_GUARD_RECOVERY_MS,
        );
        self.guards.insert(
            form,
            crate::page::GuardState::Pending {
                button,
                original_label,
                timer_id,
            },
        );
        Ok(())
    }
}

/// Wires the progressive enhancements into a [`Page`] and owns everything it
/// installed, so [`Enhancer::teardown`] can return the page to its inert
/// server-rendered behavior.
#[derive(Debug)]
pub struct Enhancer {
    listener_ids: Vec<u64>,
    timer_ids: Vec<u64>,
    guarded_forms: Vec<NodeId>,
}

impl Enhancer {
    /// Scan the page once and attach every applicable enhancement. Pages
    /// missing a given hook simply skip that enhancement.
    pub fn install(page: &mut Page) -> Result<Self> {
        let mut enhancer = Self {
            listener_ids: Vec::new(),
            timer_ids: Vec::new(),
            guarded_forms: Vec::new(),
        };

        enhancer.install_widget_registrations(page)?;
        enhancer.install_validation(page)?;
        enhancer.install_alert_dismiss(page);
        enhancer.install_currency(page)?;
        enhancer.install_delete_confirm(page)?;
        enhancer.install_month_display(page)?;
        enhancer.install_sidebar_toggle(page)?;
        enhancer.install_date_range_toggle(page)?;
        enhancer.install_color_previews(page)?;
        enhancer.install_amount_clamp(page)?;
        enhancer.install_date_autofill(page)?;
        enhancer.install_modal_close(page)?;
        enhancer.install_submit_guard(page)?;

        Ok(enhancer)
    }

    fn listen(&mut self, page: &mut Page, node: NodeId, event: &str, action: Action) {
        let id = page.add_listener(node, event, false, action);
        self.listener_ids.push(id);
    }

    fn install_widget_registrations(&mut self, page: &mut Page) -> Result<()> {
        for node in page.dom.query_selector_all("[data-bs-toggle=\"tooltip\"]")? {
            page.widgets.tooltips.insert(node);
        }
        for node in page.dom.query_selector_all("[data-bs-toggle=\"popover\"]")? {
            page.widgets.popovers.insert(node);
        }
        Ok(())
    }

    fn install_validation(&mut self, page: &mut Page) -> Result<()> {
        for form in page.dom.query_selector_all(".needs-validation")? {
            self.listen(page, form, "submit", Action::ValidateForm { form });
        }
        Ok(())
    }

    fn install_alert_dismiss(&mut self, page: &mut Page) {
        let id = page.set_timeout(Action::DismissAlerts, ALERT_DISMISS_MS);
        self.timer_ids.push(id);
    }

    fn install_currency(&mut self, page: &mut Page) -> Result<()> {
        for input in page.dom.query_selector_all(".currency-input")? {
            self.listen(page, input, "focus", Action::CurrencyFocus { input });
            self.listen(page, input, "blur", Action::CurrencyBlur { input });
        }
        Ok(())
    }

    fn install_delete_confirm(&mut self, page: &mut Page) -> Result<()> {
        for button in page.dom.query_selector_all(".btn-delete")? {
            self.listen(page, button, "click", Action::ConfirmDelete);
        }
        Ok(())
    }

    fn install_month_display(&mut self, page: &mut Page) -> Result<()> {
        let mut state = EventState::default();
        let root = page.dom.root;
        page.run_action(Action::RefreshMonthDisplays, root, &mut state)?;
        let id = page.set_interval(Action::RefreshMonthDisplays, MONTH_REFRESH_MS);
        self.timer_ids.push(id);
        Ok(())
    }

    fn install_sidebar_toggle(&mut self, page: &mut Page) -> Result<()> {
        let Some(toggler) = page.dom.by_id("sidebarToggler") else {
            return Ok(());
        };
        let Some(sidebar) = page.dom.by_id("sidebar") else {
            return Ok(());
        };
        self.listen(page, toggler, "click", Action::ToggleSidebar { sidebar });
        Ok(())
    }

    fn install_date_range_toggle(&mut self, page: &mut Page) -> Result<()> {
        let (Some(select), Some(start), Some(end)) = (
            page.dom.by_id("date-range-select"),
            page.dom.by_id("start-date"),
            page.dom.by_id("end-date"),
        ) else {
            return Ok(());
        };

        let start_container = field_container(page, start)?;
        let end_container = field_container(page, end)?;
        let action = Action::ToggleDateRange {
            select,
            start_container,
            end_container,
        };

        self.listen(page, select, "change", action.clone());
        let mut state = EventState::default();
        page.run_action(action, select, &mut state)?;
        Ok(())
    }

    fn install_color_previews(&mut self, page: &mut Page) -> Result<()> {
        for select in page.dom.query_selector_all("select[name=\"color\"]")? {
            let Some(parent) = page.dom.parent(select) else {
                continue;
            };

            // Reinstalling on an already-enhanced page reuses the swatch.
            let existing = page.dom.nodes[parent.0]
                .children
                .iter()
                .copied()
                .find(|child| {
                    page.dom
                        .element(*child)
                        .map(|element| dom::has_class(element, "color-preview"))
                        .unwrap_or(false)
                });
            let swatch = match existing {
                Some(node) => node,
                None => {
                    let span = page.dom.create_detached_element("span".to_string());
                    page.dom.set_attr(span, "class", "color-preview ms-2")?;
                    page.dom.set_attr(
                        span,
                        "style",
                        "display: inline-block; width: 20px; height: 20px; \
                         border-radius: 4px; border: 1px solid #ddd;",
                    )?;
                    page.dom.insert_after(select, span)?;
                    span
                }
            };

            let action = Action::PaintSwatch { select, swatch };
            self.listen(page, select, "change", action.clone());
            let mut state = EventState::default();
            page.run_action(action.clone(), select, &mut state)?;

            // A select inside a modal repaints when the modal is shown, so
            // server-set values render once the markup becomes visible.
            if let Some(modal) = page.dom.closest(select, ".modal")? {
                self.listen(page, modal, "shown.bs.modal", action);
            }
        }
        Ok(())
    }

    fn install_amount_clamp(&mut self, page: &mut Page) -> Result<()> {
        for input in page
            .dom
            .query_selector_all("input[type=\"number\"][min=\"0\"]")?
        {
            self.listen(page, input, "change", Action::ClampNonNegative { input });
        }
        Ok(())
    }

    fn install_date_autofill(&mut self, page: &mut Page) -> Result<()> {
        let today = CivilDate::from_unix_ms(page.now_ms()).iso_date();
        for input in page.dom.query_selector_all("input[type=\"date\"]")? {
            if page.dom.value(input)?.is_empty() {
                page.dom.set_value(input, &today)?;
            }
        }
        Ok(())
    }

    fn install_modal_close(&mut self, page: &mut Page) -> Result<()> {
        for form in page.dom.query_selector_all(".modal form")? {
            self.listen(page, form, "submit", Action::CloseModalSoon { form });
        }
        Ok(())
    }

    fn install_submit_guard(&mut self, page: &mut Page) -> Result<()> {
        for form in page.dom.query_selector_all("form")? {
            self.listen(page, form, "submit", Action::GuardSubmit { form });
            self.guarded_forms.push(form);
        }
        Ok(())
    }

    /// Detach everything this enhancer installed: listeners come off, owned
    /// timers are cancelled, and any in-flight submission guard is released
    /// so no button stays disabled with no timer left to recover it.
    pub fn teardown(self, page: &mut Page) -> Result<()> {
        for id in self.listener_ids {
            page.remove_listener(id);
        }
        for id in self.timer_ids {
            page.clear_timer(id);
        }
        for id in std::mem::take(&mut page.widgets.pending_closes) {
            page.clear_timer(id);
        }
        for form in self.guarded_forms {
            page.release_guard(form, true)?;
        }
        Ok(())
    }
}

fn field_container(page: &Page, field: NodeId) -> Result<NodeId> {
    if let Some(container) = page.dom.closest(field, FIELD_CONTAINER_SELECTOR)? {
        return Ok(container);
    }
    Ok(page.dom.parent(field).unwrap_or(field))
}
