use proptree::prop::{Prop, SetValue};
use proptree::sub::PropTree;

pub const URL_PREFIX: &str = "stpp://";

/// The backend route claims every URL in the protocol's scheme.
#[inline]
pub fn can_handle(url: &str) -> bool {
    url.starts_with(URL_PREFIX)
}

/// Open a page for a claimed URL: the page model is typed so the UI picks
/// the protocol-driven view.
pub fn open(tree: &dyn PropTree, page: &Prop, _url: &str) {
    tree.set_down(
        Some(page),
        "model.type",
        SetValue::Str("stpp".to_string()),
    );
}
