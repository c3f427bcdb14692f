pub(crate) mod action;
pub(crate) mod form_view;
pub(crate) mod popup;
pub(crate) mod utils;
