/// Submission form: primary value, tags, status and recent submissions

use std::rc::Rc;

use patternfly_yew::prelude::*;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::api::{HttpSubmission, HttpTagDirectory};
use crate::config::FormConfig;
use crate::operations::{self, PendingSelections};
use crate::selector::TagSelector;
use crate::storage::RecentShares;
use crate::ui::components::{RecentList, StatusBanner, StatusMessage, schedule};
use crate::ui::tag_input::{SelectorHandle, TagInput};

#[derive(Properties, PartialEq)]
pub struct ShareFormProps {
    pub config: Rc<FormConfig>,
    pub directory: Rc<HttpTagDirectory>,
    pub submission: Rc<HttpSubmission>,
}

#[function_component(ShareForm)]
pub fn share_form(props: &ShareFormProps) -> Html {
    let config = props.config.clone();
    let selector = use_mut_ref(TagSelector::new);
    let pending = use_memo((), |_| PendingSelections::default());
    let force_update = use_force_update();
    let instance_id = use_state(Uuid::new_v4);
    let value = use_state(String::new);
    let status = use_state(|| None::<StatusMessage>);
    let status_seq = use_mut_ref(|| 0u64);
    let submitting = use_state(|| false);
    let recent_limit = config.recent_limit;
    let recent = use_state(move || {
        if recent_limit > 0 {
            RecentShares::load()
        } else {
            RecentShares::new()
        }
    });

    let handle = SelectorHandle {
        selector: selector.clone(),
        directory: props.directory.clone(),
        pending: pending.clone(),
    };

    let on_change = {
        let force_update = force_update.clone();
        Callback::from(move |_| force_update.force_update())
    };

    // Show a status; everything but errors clears itself unless replaced first
    let on_status = {
        let status = status.clone();
        let status_seq = status_seq.clone();
        let dismiss_ms = config.status_dismiss_ms;

        Callback::from(move |message: StatusMessage| {
            let seq = {
                let mut current = status_seq.borrow_mut();
                *current += 1;
                *current
            };

            if let Some(delay) = message.auto_dismiss_after(dismiss_ms) {
                let status = status.clone();
                let status_seq = status_seq.clone();
                schedule(delay, move || {
                    if *status_seq.borrow() == seq {
                        status.set(None);
                    }
                });
            }

            status.set(Some(message));
        })
    };

    // Load the directory once on mount
    {
        let handle = handle.clone();
        let on_change = on_change.clone();
        let on_status = on_status.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let ticket = handle.selector.borrow_mut().begin_refresh();
                if let Err(e) = operations::refresh(&handle.selector, &*handle.directory, ticket).await {
                    on_status.emit(StatusMessage::from(&e));
                }
                on_change.emit(());
            });
            || ()
        });
    }

    let on_value_input = {
        let value = value.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                value.set(input.value());
            }
        })
    };

    let on_clear = {
        let value = value.clone();
        let status = status.clone();
        Callback::from(move |_| {
            value.set(String::new());
            status.set(None);
        })
    };

    let on_submit = {
        let selector = selector.clone();
        let pending = pending.clone();
        let submission = props.submission.clone();
        let config = config.clone();
        let value = value.clone();
        let submitting = submitting.clone();
        let recent = recent.clone();
        let on_status = on_status.clone();
        let force_update = force_update.clone();

        Callback::from(move |_: ()| {
            if *submitting {
                return;
            }
            submitting.set(true);

            let raw_value = (*value).clone();
            let selector = selector.clone();
            let pending = pending.clone();
            let submission = submission.clone();
            let config = config.clone();
            let value = value.clone();
            let submitting = submitting.clone();
            let recent = recent.clone();
            let on_status = on_status.clone();
            let force_update = force_update.clone();

            spawn_local(async move {
                match operations::submit(&selector, &*submission, &pending, &config, &raw_value).await {
                    Ok(sent) => {
                        value.set(String::new());
                        if config.recent_limit > 0 {
                            let mut shares = RecentShares::load();
                            shares.record(&sent.value, config.recent_limit);
                            shares.save();
                            recent.set(shares);
                        }
                        on_status.emit(StatusMessage::success(config.success_message.clone()));
                    }
                    Err(e) => on_status.emit(StatusMessage::from(&e)),
                }
                submitting.set(false);
                force_update.force_update();
            });
        })
    };

    let on_value_keydown = {
        let value = value.clone();
        let status = status.clone();
        let on_submit = on_submit.clone();

        Callback::from(move |e: KeyboardEvent| match e.key().as_str() {
            "Enter" if !e.shift_key() => {
                e.prevent_default();
                on_submit.emit(());
            }
            "Escape" => {
                e.prevent_default();
                value.set(String::new());
                status.set(None);
            }
            _ => {}
        })
    };

    let prevent_native_submit = Callback::from(|e: SubmitEvent| e.prevent_default());

    let value_id = format!("primary-{}", *instance_id);
    let tags_id = format!("tags-{}", *instance_id);
    let view = selector.borrow().view();

    html! {
        <form class="share-form" onsubmit={prevent_native_submit}>
            <label class="field-label" for={value_id.clone()}>{&config.primary_label}</label>
            <input
                id={value_id}
                type="text"
                class="primary-input"
                placeholder={config.placeholder.clone()}
                value={(*value).clone()}
                oninput={on_value_input}
                onkeydown={on_value_keydown}
            />

            <label class="field-label" for={tags_id.clone()}>{"Tags"}</label>
            <TagInput
                handle={handle}
                view={view}
                input_id={tags_id}
                on_change={on_change}
                on_status={on_status}
            />

            <div class="form-actions">
                <Button onclick={on_submit.reform(|_| ())} disabled={*submitting} variant={ButtonVariant::Primary}>
                    {"Submit"}
                </Button>
                <Button onclick={on_clear} disabled={*submitting} variant={ButtonVariant::Secondary}>
                    {"Clear"}
                </Button>
                if *submitting {
                    <Spinner />
                }
            </div>

            <StatusBanner status={(*status).clone()} />
            <RecentList entries={recent.entries.clone()} />
        </form>
    }
}
