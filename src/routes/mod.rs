pub(crate) mod compare;
pub(crate) mod health;
pub(crate) mod series;
pub(crate) mod summary;
pub(crate) mod symbols;
