pub(crate) mod api;
pub(crate) mod data_type;
pub(crate) mod document;
pub(crate) mod forward;
pub(crate) mod lint;
