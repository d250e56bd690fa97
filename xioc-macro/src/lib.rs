use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    Expr, ExprArray, ExprLit, ItemFn, Lit, MetaNameValue, ReturnType, Type, parse_macro_input,
    punctuated::Punctuated, token::Comma,
};

const LIFESTYLES: &[&str] = &[
    "transient",
    "singleton",
    "per_scope",
    "per_object_graph",
    "weak_singleton",
    "thread_static",
    "task_local",
];

/// Export the value built by a constructor function.
///
/// ```ignore
/// #[xioc::export(lifestyle = "singleton", as_trait = [IService])]
/// fn service(config: Arc<Config>) -> Service { .. }
/// ```
///
/// Constructors returning `...Result<T, E>` are registered as fallible, `Option<T>` as nullable.
/// Registrations are applied by `Container::inject_registrations`.
#[proc_macro_attribute]
pub fn export(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated::<MetaNameValue, Comma>::parse_terminated);
    let input_fn = parse_macro_input!(item as ItemFn);

    match expand(args, input_fn) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: Punctuated<MetaNameValue, Comma>, input_fn: ItemFn) -> syn::Result<TokenStream2> {
    let mut lifestyle = None;
    let mut traits = Vec::new();

    for arg in &args {
        match arg.path.get_ident().map(|x| x.to_string()).as_deref() {
            Some("lifestyle") => {
                let Expr::Lit(ExprLit {
                    lit: Lit::Str(value),
                    ..
                }) = &arg.value
                else {
                    return Err(syn::Error::new_spanned(&arg.value, "expected a string lifestyle"));
                };

                let value = value.value();

                if !LIFESTYLES.contains(&value.as_str()) {
                    return Err(syn::Error::new_spanned(
                        &arg.value,
                        format!("unknown lifestyle, expected one of {}", LIFESTYLES.join(", ")),
                    ));
                }

                lifestyle = Some(format_ident!("{value}"));
            }
            Some("as_trait") => {
                let Expr::Array(ExprArray { elems, .. }) = &arg.value else {
                    return Err(syn::Error::new_spanned(&arg.value, "expected a list of traits"));
                };

                traits.extend(elems.iter().cloned());
            }
            _ => return Err(syn::Error::new_spanned(&arg.path, "unknown argument")),
        }
    }

    let crate_name = match proc_macro_crate::crate_name("xioc") {
        Ok(proc_macro_crate::FoundCrate::Itself) => quote! { crate },
        Ok(proc_macro_crate::FoundCrate::Name(name)) => {
            let name = syn::Ident::new(&name, Span::call_site());
            quote! { ::#name }
        }
        Err(err) => return Err(syn::Error::new(Span::call_site(), err.to_string())),
    };

    let fn_name = &input_fn.sig.ident;
    let register_fn = format_ident!("__xioc_register_{fn_name}");

    let constructor = match return_kind(&input_fn.sig.output) {
        ReturnKind::Result => quote! { #crate_name::Fallible(#fn_name) },
        ReturnKind::Option => quote! { #crate_name::Nullable(#fn_name) },
        ReturnKind::Plain => quote! { #fn_name },
    };

    let lifestyle = lifestyle.map(|x| quote! { let export = export.#x(); });

    let exports = traits
        .iter()
        .map(|x| quote! { let export = export.as_trait::<dyn #x>(|x| x); });

    Ok(quote! {
        #input_fn

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #register_fn(block: &mut #crate_name::ExportRegistrationBlock) {
            let export = block.export(#constructor);
            #lifestyle
            #(#exports)*
            drop(export);
        }

        #crate_name::__inventory::submit! {
            #crate_name::Registration::new(#register_fn)
        }
    })
}

enum ReturnKind {
    Plain,
    Result,
    Option,
}

fn return_kind(output: &ReturnType) -> ReturnKind {
    let ReturnType::Type(_, ty) = output else {
        return ReturnKind::Plain;
    };

    let Type::Path(path) = ty.as_ref() else {
        return ReturnKind::Plain;
    };

    match path.path.segments.last().map(|x| x.ident.to_string()) {
        Some(name) if name.ends_with("Result") => ReturnKind::Result,
        Some(name) if name == "Option" => ReturnKind::Option,
        _ => ReturnKind::Plain,
    }
}
