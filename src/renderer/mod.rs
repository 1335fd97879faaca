pub(crate) mod colours;
pub(crate) mod drawing;
pub(crate) mod fonts;
pub(crate) mod projection;
pub(crate) mod widgets;
