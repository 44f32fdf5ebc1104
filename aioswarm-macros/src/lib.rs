use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{FnArg, Ident, ItemFn, Pat, PatType};

/// Proc macro to denote a Task
///
/// Turns an `async fn` taking a user `Context` into a plain function returning a boxed
/// `TaskFuture`, which is what `Task::new` and the `tasks!` macro expect. The function may return
/// `()` or `Result<(), E>` for any `E` convertible into a boxed error.
///
/// NOTE: Arguments must be simple identifiers, and generics are not supported.
///
/// # Example
/// ```ignore
/// use aioswarm::prelude::*;
///
/// #[task]
/// async fn browse(ctx: Context<MyUser>) -> Result<(), MyError> {
///     ...
/// }
/// ```
#[proc_macro_attribute]
pub fn task(attr: TokenStream, item: TokenStream) -> TokenStream {
    task_internal(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn task_internal(_attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let input = syn::parse2::<ItemFn>(item)?;

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[task] only works on async functions",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[task] functions cannot be generic",
        ));
    }

    let mut args = vec![];
    let mut outer_inputs = vec![];
    for input in sig.inputs.iter() {
        match input {
            FnArg::Typed(PatType { pat, ty, .. }) => match &**pat {
                Pat::Ident(pat) => {
                    let ident = &pat.ident;
                    outer_inputs.push(quote! { #ident: #ty });
                    args.push(ident.clone());
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "#[task] arguments must be plain identifiers",
                    ))
                }
            },
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[task] cannot be used on methods",
                ))
            }
        }
    }

    let task_name = sig.ident.clone();
    let inner_name = Ident::new(&format!("__aioswarm_{}", sig.ident), Span::call_site());
    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_name.clone();

    Ok(quote! {
        #(#attrs)* #vis fn #task_name(#(#outer_inputs),*) -> ::aioswarm::task::TaskFuture {
            #inner_sig #block

            ::std::boxed::Box::pin(async move {
                ::aioswarm::task::IntoTaskResult::into_task_result(#inner_name(#(#args),*).await)
            })
        }
    })
}
