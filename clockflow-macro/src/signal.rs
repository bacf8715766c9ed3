use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use super::utils::{clog2, get_enum_encode_value, get_enum_width};

pub(super) fn derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let name = &ast.ident;

    let expanded: proc_macro2::TokenStream = match ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { ref named, .. }), ..
        }) => {
            let ty_widths = named.iter().map(|f| {
                let ty = &f.ty;
                quote! { <#ty as Signal>::WIDTH }
            });

            // fields for `transl`, least significant first.
            let into_fields = named.iter().map(|f| {
                let name = &f.ident;
                quote! { .chain(self.#name.transl()) }
            });

            // fields for `from_transl`.
            let from_fields = named.iter().map(|f| {
                let name = &f.ident;
                let ty = &f.ty;
                quote! {
                    let #name = {
                        let __width = <#ty as Signal>::WIDTH;
                        let __value = <#ty as Signal>::from_transl(&__bits[__offset..__offset + __width]);
                        __offset += __width;
                        __value
                    };
                }
            });
            let field_names = named.iter().map(|f| &f.ident);

            quote! {
                impl #impl_generics Signal for #name #ty_generics #where_clause {
                    const WIDTH: usize = 0 #(+ #ty_widths)*;

                    fn transl(self) -> Vec<bool> {
                        ::std::iter::empty()#(#into_fields)*.collect::<Vec<bool>>()
                    }

                    #[allow(unused_mut, unused_assignments)]
                    fn from_transl(__bits: &[bool]) -> Self {
                        assert_eq!(
                            __bits.len(),
                            <Self as Signal>::WIDTH,
                            "bit width mismatch while decoding `{}`",
                            stringify!(#name)
                        );
                        let mut __offset = 0;
                        #(#from_fields)*
                        Self { #(#field_names,)* }
                    }
                }
            }
        }
        syn::Data::Enum(syn::DataEnum { ref variants, .. }) => {
            let variant_count = variants.len();
            assert!(variant_count > 0, "{name}: empty enums cannot be derived as `Signal`");
            let width = match get_enum_width(&ast.attrs) {
                Some(width) => {
                    width.base10_parse::<usize>().unwrap_or_else(|_| panic!("{name}: enum width should be usize"))
                }
                None if variant_count == 1 => 1,
                None => clog2(variant_count),
            };

            let encodings = variants
                .iter()
                .enumerate()
                .map(|(i, variant)| {
                    let variant_name = &variant.ident;
                    assert!(
                        matches!(variant.fields, syn::Fields::Unit),
                        "{name}::{variant_name}: only unit variants can be derived as `Signal`"
                    );

                    let encode_value = match get_enum_encode_value(&variant.attrs) {
                        Some(lit) => lit
                            .base10_parse::<usize>()
                            .unwrap_or_else(|_| panic!("encoding value of {name}::{variant_name} should be usize")),
                        None => i,
                    };
                    assert!(
                        encode_value < (1 << width),
                        "{encode_value} (encoding of {name}::{variant_name}) exceeds maximum for {width} bits",
                    );

                    (variant_name, encode_value)
                })
                .collect::<Vec<_>>();

            let into_variants = encodings.iter().map(|(variant_name, encode_value)| {
                quote! { Self::#variant_name => #encode_value, }
            });
            let from_variants = encodings.iter().map(|(variant_name, encode_value)| {
                quote! { #encode_value => Self::#variant_name, }
            });

            quote! {
                impl #impl_generics Signal for #name #ty_generics #where_clause {
                    const WIDTH: usize = #width;

                    fn transl(self) -> Vec<bool> {
                        let __value: usize = match self {
                            #(#into_variants)*
                        };
                        (0..#width).map(|__idx| ((__value >> __idx) & 1) != 0).collect::<Vec<bool>>()
                    }

                    fn from_transl(__bits: &[bool]) -> Self {
                        assert_eq!(__bits.len(), #width, "bit width mismatch while decoding `{}`", stringify!(#name));
                        let __value =
                            __bits.iter().rev().fold(0usize, |__acc, __bit| (__acc << 1) | usize::from(*__bit));
                        match __value {
                            #(#from_variants)*
                            _ => Self::default(),
                        }
                    }
                }
            }
        }
        _ => panic!("{name}: `Signal` can only be derived for structs with named fields and enums"),
    };

    expanded.into()
}
