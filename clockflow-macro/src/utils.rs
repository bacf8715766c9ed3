use syn::{Attribute, LitInt};

/// Returns ceiling log2.
pub(super) fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (usize::BITS - (value - 1).leading_zeros()) as usize
    }
}

/// Finds `#[attr_name(N)]` and returns `N`.
fn get_int_attr(attrs: &[Attribute], attr_name: &str) -> Option<LitInt> {
    attrs.iter().find_map(|attr| match attr.parse_meta() {
        Ok(syn::Meta::List(list)) if list.path.is_ident(attr_name) => list.nested.iter().find_map(|nested| {
            match nested {
                syn::NestedMeta::Lit(syn::Lit::Int(value)) => Some(value.clone()),
                _ => None,
            }
        }),
        _ => None,
    })
}

pub(super) fn get_enum_width(attrs: &[Attribute]) -> Option<LitInt> { get_int_attr(attrs, "width") }

pub(super) fn get_enum_encode_value(attrs: &[Attribute]) -> Option<LitInt> { get_int_attr(attrs, "encode") }
