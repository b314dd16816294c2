pub(crate) mod limits;
pub(crate) mod meta;
pub(crate) mod search;
pub(crate) mod serve;
