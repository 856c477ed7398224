use proc_macro::TokenStream;
use quote::quote;

use syn::spanned::Spanned as _;
use syn::{DeriveInput, Error, LitStr};

const BEAN_ATTR: &str = "bean";

#[derive(Default)]
struct BeanAttrs {
    name: Option<LitStr>,
    interceptor: bool,
    decorator: bool,
    alternative: bool,
    stereotype: bool,
}

fn parse_bean_attrs(input: &DeriveInput) -> Result<BeanAttrs, Error> {
    let mut attrs = BeanAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident(BEAN_ATTR) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("interceptor") {
                attrs.interceptor = true;
            } else if meta.path.is_ident("decorator") {
                attrs.decorator = true;
            } else if meta.path.is_ident("alternative") {
                attrs.alternative = true;
            } else if meta.path.is_ident("stereotype") {
                attrs.stereotype = true;
            } else if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                if name.value().is_empty() {
                    return Err(Error::new(name.span(), "Bean class name must not be empty"));
                }
                attrs.name = Some(name);
            } else {
                return Err(meta.error(format!("Unsupported #[{BEAN_ATTR}] option")));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

/// Derive macro for the BeanType trait
///
/// The class name defaults to the module path of the type followed by its
/// identifier. Markers are declared with `#[bean(interceptor)]`,
/// `#[bean(decorator)]`, `#[bean(alternative)]` and `#[bean(stereotype)]`.
#[proc_macro_derive(BeanType, attributes(bean))]
pub fn derive_bean_type(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    handle_derive_bean_type(input)
}

fn handle_derive_bean_type(input: DeriveInput) -> TokenStream {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return TokenStream::from(
            Error::new(input.generics.span(), "Generic types are not supported").to_compile_error(),
        );
    }
    let attrs = match parse_bean_attrs(&input) {
        Ok(v) => v,
        Err(err) => return TokenStream::from(err.to_compile_error()),
    };

    let class_name: proc_macro2::TokenStream = match &attrs.name {
        Some(name) => quote! { #name },
        None => quote! { ::std::concat!(::std::module_path!(), "::", ::std::stringify!(#ident)) },
    };
    let BeanAttrs {
        interceptor,
        decorator,
        alternative,
        stereotype,
        ..
    } = attrs;

    quote! {
        impl ::kiln::BeanType for #ident {
            fn class_name() -> &'static str {
                #class_name
            }

            fn markers() -> ::kiln::Markers {
                ::kiln::Markers {
                    interceptor: #interceptor,
                    decorator: #decorator,
                    alternative: #alternative,
                    stereotype: #stereotype,
                }
            }
        }
    }
    .into()
}
