mod error_kind;

use error_kind::ErrorKindTarget;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derives the [`ErrorKind`] trait for the given struct.
///
/// This trait can be derived for any kind of struct.
///
/// The information of the error can be customized using the `error` attribute by adding the
/// corresponding tags to it:
/// ```ignore
/// use pertsym_attrs::ErrorKind;
/// use pertsym_error::ErrorKind;
///
/// #[derive(Debug, ErrorKind)]
/// #[error(
///     message = format!("cannot rewrite `{}`", node),
///     labels = ["this node"],
///     help = "build the expression from node kinds with a rewrite rule",
/// )]
/// pub struct Foo {
///     node: String,
/// }
/// ```
///
/// The following tags are available:
///
/// | Tag         | Description                                                                  |
/// | ----------- | ---------------------------------------------------------------------------- |
/// | `message`   | The message displayed at the top of the error when it is displayed.          |
/// | `labels`    | The texts of the labels pointing at each span of the error, in span order.   |
/// | `help`      | Optional help text for the error, describing what the user can do to fix it. |
/// | `note`      | Optional note with further context, shown after the help text.              |
///
/// Each tag accepts an expression. `message` and `help` should evaluate to something implementing
/// [`ToString`], and `labels` to an iterable of such values. For structs with named fields, the
/// expression is evaluated with the members of the struct in scope, so they can be used in the
/// expression (tuple structs are not supported). Each tag may be given at most once.
///
/// The derive also implements `ErrorKind::message`, which evaluates the `message` tag on its own.
///
/// The generated code refers to the `ariadne` and `pertsym_error` crates, which must be
/// dependencies of the crate using the derive.
#[proc_macro_derive(ErrorKind, attributes(error))]
pub fn error_kind(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let target = match ErrorKindTarget::from_input(input) {
        Ok(target) => target,
        Err(err) => return err.to_compile_error().into(),
    };
    let name = &target.name;
    quote! {
        impl ErrorKind for #name {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            #target
        }
    }.into()
}
