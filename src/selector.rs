/// Tag selector state: selection, filter text, dropdown and directory snapshot
///
/// Everything here is synchronous. Network calls live in `operations`, which
/// borrow a `TagSelector` only between awaits.
use std::collections::HashSet;

use crate::tag::{Tag, TagSet};

/// Generation number attached to one directory read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Selection generation; `reset` starts a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEpoch(u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dropdown {
    #[default]
    Closed,
    Open,
}

/// One entry of the dropdown
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    Existing(Tag),
    /// Offered when nothing in the directory matches the filter
    Create(Tag),
}

impl Suggestion {
    pub fn tag(&self) -> &Tag {
        match self {
            Suggestion::Existing(tag) | Suggestion::Create(tag) => tag,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Suggestion::Existing(tag) => tag.to_string(),
            Suggestion::Create(tag) => format!("Add \"{}\"", tag),
        }
    }
}

/// What `select` has to do for a given tag
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPlan {
    AlreadySelected,
    /// In the snapshot; carries the directory's spelling
    Known(Tag),
    /// Must be created in the directory before it can be selected
    Missing(Tag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer read was issued after this one; its result was dropped
    Stale,
}

/// Everything the UI needs to draw the selector
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorView {
    pub chips: Vec<Tag>,
    pub filter: String,
    pub dropdown: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSelector {
    selection: TagSet,
    filter: String,
    focused: bool,
    dropdown: Dropdown,
    snapshot: Vec<Tag>,
    generation: u64,
    epoch: u64,
}

impl TagSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &TagSet {
        &self.selection
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn dropdown(&self) -> Dropdown {
        self.dropdown
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn snapshot(&self) -> &[Tag] {
        &self.snapshot
    }

    /// Update the filter text and start a new directory read
    pub fn set_filter(&mut self, query: &str) -> RefreshTicket {
        self.filter = query.to_string();
        if !query.is_empty() {
            self.dropdown = Dropdown::Open;
        }
        self.begin_refresh()
    }

    /// Issue a ticket for a directory read; any earlier ticket becomes stale
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        RefreshTicket(self.generation)
    }

    pub fn selection_epoch(&self) -> SelectionEpoch {
        SelectionEpoch(self.epoch)
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Replace the snapshot with a directory listing, unless a newer read is pending
    pub fn apply_snapshot(&mut self, ticket: RefreshTicket, names: Vec<String>) -> RefreshOutcome {
        if !self.is_current(ticket) {
            return RefreshOutcome::Stale;
        }
        self.snapshot = normalize_directory(names);
        RefreshOutcome::Applied
    }

    /// Tags matching the filter that are not selected yet, then a create entry
    /// when the filter matches nothing.
    pub fn suggestions(&self) -> impl Iterator<Item = Suggestion> + '_ {
        let create = self.create_candidate().map(Suggestion::Create);
        self.matching_tags()
            .cloned()
            .map(Suggestion::Existing)
            .chain(create)
    }

    fn needle(&self) -> String {
        self.filter.trim().to_lowercase()
    }

    fn matching_tags(&self) -> impl Iterator<Item = &Tag> + '_ {
        let needle = self.needle();
        let visible = self.focused || !needle.is_empty();
        self.snapshot
            .iter()
            .filter(move |tag| visible && tag.contains_lowercase(&needle))
            .filter(move |tag| !self.selection.contains(tag))
    }

    fn create_candidate(&self) -> Option<Tag> {
        let tag = Tag::new(&self.filter).ok()?;
        if self.selection.contains(&tag) || self.matching_tags().next().is_some() {
            None
        } else {
            Some(tag)
        }
    }

    pub fn plan_selection(&self, tag: Tag) -> SelectionPlan {
        if self.selection.contains(&tag) {
            return SelectionPlan::AlreadySelected;
        }
        match self.snapshot.iter().find(|known| **known == tag) {
            Some(known) => SelectionPlan::Known(known.clone()),
            None => SelectionPlan::Missing(tag),
        }
    }

    /// Add a tag that is known to exist in the directory.
    ///
    /// Clears the filter and closes the dropdown. Returns false when the tag was
    /// already selected.
    pub fn complete_selection(&mut self, tag: Tag) -> bool {
        if !self.snapshot.contains(&tag) {
            self.snapshot.push(tag.clone());
            self.snapshot.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        }
        self.filter.clear();
        self.dropdown = Dropdown::Closed;
        self.selection.insert(tag)
    }

    /// Like `complete_selection`, but drops a tag whose selection began before
    /// the last `reset`. The tag is still recorded in the snapshot.
    pub fn complete_selection_in(&mut self, epoch: SelectionEpoch, tag: Tag) -> bool {
        if epoch.0 != self.epoch {
            if !self.snapshot.contains(&tag) {
                self.snapshot.push(tag);
                self.snapshot.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            }
            return false;
        }
        self.complete_selection(tag)
    }

    /// A create for `tag` failed: drop its text from the input and close the
    /// dropdown. Text typed since the create started is left alone.
    pub fn abandon_selection(&mut self, tag: &Tag) {
        if Tag::new(&self.filter).is_ok_and(|typed| typed == *tag) {
            self.filter.clear();
            self.dropdown = Dropdown::Closed;
        }
    }

    /// Local only; the tag stays in the directory
    pub fn deselect(&mut self, tag: &Tag) -> bool {
        self.selection.remove(tag)
    }

    /// Take the trimmed filter text as a tag to commit, clearing the filter
    pub fn take_pending_input(&mut self) -> Option<Tag> {
        let pending = Tag::new(&self.filter).ok()?;
        self.filter.clear();
        self.dropdown = Dropdown::Closed;
        Some(pending)
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.dropdown = Dropdown::Open;
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.dropdown = Dropdown::Closed;
    }

    /// Escape or outside click
    pub fn close(&mut self) {
        self.dropdown = Dropdown::Closed;
    }

    pub fn reset(&mut self) {
        self.epoch += 1;
        self.selection.clear();
        self.filter.clear();
        self.dropdown = Dropdown::Closed;
    }

    pub fn view(&self) -> SelectorView {
        let dropdown = match self.dropdown {
            Dropdown::Closed => None,
            Dropdown::Open => {
                let items: Vec<Suggestion> = self.suggestions().collect();
                if items.is_empty() { None } else { Some(items) }
            }
        };

        SelectorView {
            chips: self.selection.iter().cloned().collect(),
            filter: self.filter.clone(),
            dropdown,
        }
    }
}

/// Sort a directory listing and drop blank and case-insensitive duplicate names
fn normalize_directory(names: Vec<String>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = names.iter().filter_map(|name| Tag::new(name).ok()).collect();
    tags.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let mut seen = HashSet::new();
    tags.retain(|tag| seen.insert(tag.key()));
    tags
}
