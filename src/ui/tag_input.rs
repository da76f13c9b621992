/// Tag input: selected chips, the filter box and the suggestion dropdown

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::api::HttpTagDirectory;
use crate::error::ShareError;
use crate::operations::{self, PendingSelections, SelectOutcome};
use crate::selector::{RefreshOutcome, SelectorView, Suggestion, TagSelector};
use crate::tag::Tag;
use crate::ui::components::StatusMessage;

/// What a key press in the tag input means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIntent {
    Commit,
    Dismiss,
    Ignore,
}

pub fn key_intent(key: &str) -> KeyIntent {
    match key {
        "Enter" | "Tab" | "," => KeyIntent::Commit,
        "Escape" => KeyIntent::Dismiss,
        _ => KeyIntent::Ignore,
    }
}

/// One form's selector together with the directory it reads from
#[derive(Clone)]
pub struct SelectorHandle {
    pub selector: Rc<RefCell<TagSelector>>,
    pub directory: Rc<HttpTagDirectory>,
    /// Shared with the form's submit so it waits for commits still in flight
    pub pending: Rc<PendingSelections>,
}

impl PartialEq for SelectorHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.selector, &other.selector)
            && Rc::ptr_eq(&self.directory, &other.directory)
            && Rc::ptr_eq(&self.pending, &other.pending)
    }
}

#[derive(Properties, PartialEq)]
pub struct TagInputProps {
    pub handle: SelectorHandle,
    /// Rendered state; the parent recomputes it after every change
    pub view: SelectorView,
    pub input_id: AttrValue,
    pub on_change: Callback<()>,
    pub on_status: Callback<StatusMessage>,
}

fn report_refresh(result: Result<RefreshOutcome, ShareError>, on_status: &Callback<StatusMessage>) {
    if let Err(e) = result {
        on_status.emit(StatusMessage::from(&e));
    }
}

fn report_selection(result: Result<SelectOutcome, ShareError>, on_status: &Callback<StatusMessage>) {
    match result {
        Ok(SelectOutcome::Created(tag)) => {
            on_status.emit(StatusMessage::info(format!("Tag \"{}\" added successfully", tag)));
        }
        Ok(_) => {}
        Err(e) => on_status.emit(StatusMessage::from(&e)),
    }
}

#[function_component(TagInput)]
pub fn tag_input(props: &TagInputProps) -> Html {
    let listbox_id = format!("{}-listbox", props.input_id);

    let on_input = {
        let handle = props.handle.clone();
        let on_change = props.on_change.clone();
        let on_status = props.on_status.clone();

        Callback::from(move |e: InputEvent| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let query = input.value();
            let handle = handle.clone();
            let on_change = on_change.clone();
            let on_status = on_status.clone();

            spawn_local(async move {
                let result = operations::set_filter(&handle.selector, &*handle.directory, &query).await;
                report_refresh(result, &on_status);
                on_change.emit(());
            });
        })
    };

    let on_focus = {
        let handle = props.handle.clone();
        let on_change = props.on_change.clone();
        let on_status = props.on_status.clone();

        Callback::from(move |_: FocusEvent| {
            let handle = handle.clone();
            let on_change = on_change.clone();
            let on_status = on_status.clone();

            spawn_local(async move {
                let result = operations::focus(&handle.selector, &*handle.directory).await;
                report_refresh(result, &on_status);
                on_change.emit(());
            });
        })
    };

    // Pick a tag by value; used by the dropdown, Enter/Tab/comma and blur
    let on_pick = {
        let handle = props.handle.clone();
        let on_change = props.on_change.clone();
        let on_status = props.on_status.clone();

        Callback::from(move |tag: Option<Tag>| {
            let handle = handle.clone();
            let on_change = on_change.clone();
            let on_status = on_status.clone();

            spawn_local(async move {
                let SelectorHandle {
                    selector,
                    directory,
                    pending,
                } = &handle;
                let result = match tag {
                    Some(tag) => operations::select(selector, &**directory, pending, tag).await,
                    None => operations::commit_pending_input(selector, &**directory, pending).await,
                };
                report_selection(result, &on_status);
                on_change.emit(());
            });
        })
    };

    let on_blur = {
        let handle = props.handle.clone();
        let on_change = props.on_change.clone();
        let on_pick = on_pick.clone();

        Callback::from(move |_: FocusEvent| {
            handle.selector.borrow_mut().blur();
            on_change.emit(());
            on_pick.emit(None);
        })
    };

    let on_keydown = {
        let handle = props.handle.clone();
        let on_change = props.on_change.clone();
        let on_pick = on_pick.clone();

        Callback::from(move |e: KeyboardEvent| match key_intent(&e.key()) {
            KeyIntent::Commit => {
                e.prevent_default();
                on_pick.emit(None);
            }
            KeyIntent::Dismiss => {
                handle.selector.borrow_mut().close();
                on_change.emit(());
            }
            KeyIntent::Ignore => {}
        })
    };

    let on_remove = {
        let handle = props.handle.clone();
        let on_change = props.on_change.clone();

        Callback::from(move |tag: Tag| {
            handle.selector.borrow_mut().deselect(&tag);
            on_change.emit(());
        })
    };

    let view = &props.view;

    html! {
        <div class="tag-selector">
            <div class="selected-tags">
                {for view.chips.iter().map(|tag| {
                    let remove_tag = tag.clone();
                    html! {
                        <div key={tag.key()} class="selected-tag">
                            <span>{tag.as_str()}</span>
                            <span
                                class="selected-tag-remove"
                                title="Remove tag"
                                onclick={on_remove.reform(move |_: MouseEvent| remove_tag.clone())}
                            >
                                {"×"}
                            </span>
                        </div>
                    }
                })}
            </div>

            <input
                id={props.input_id.clone()}
                type="text"
                class="tag-search"
                placeholder="Search or add tags..."
                autocomplete="off"
                role="combobox"
                aria-controls={listbox_id.clone()}
                aria-expanded={if view.dropdown.is_some() { "true" } else { "false" }}
                value={view.filter.clone()}
                oninput={on_input}
                onfocus={on_focus}
                onblur={on_blur}
                onkeydown={on_keydown}
            />

            if let Some(items) = &view.dropdown {
                <div id={listbox_id} class="tag-dropdown active" role="listbox">
                    {for items.iter().map(|suggestion| {
                        let class = match suggestion {
                            Suggestion::Existing(_) => classes!("tag-dropdown-item"),
                            Suggestion::Create(_) => classes!("tag-dropdown-item", "add-tag-option"),
                        };
                        let tag = suggestion.tag().clone();
                        let on_pick = on_pick.clone();

                        // mousedown, so the input keeps focus and does not commit its text first
                        let on_mousedown = Callback::from(move |e: MouseEvent| {
                            e.prevent_default();
                            on_pick.emit(Some(tag.clone()));
                        });

                        html! {
                            <div key={suggestion.label()} class={class} role="option" onmousedown={on_mousedown}>
                                {suggestion.label()}
                            </div>
                        }
                    })}
                </div>
            }
        </div>
    }
}
