/// UI module exports
pub mod components;
pub mod share_form;
pub mod tag_input;
