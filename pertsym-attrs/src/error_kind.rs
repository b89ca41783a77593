use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, quote_spanned, ToTokens};
use syn::{meta::ParseNestedMeta, DeriveInput, Data, Expr, Fields, Ident, Result};

/// The tags of the `error` attribute.
#[derive(Default)]
struct ErrorArgs {
    message: Option<Expr>,
    labels: Option<Expr>,
    help: Option<Expr>,
    note: Option<Expr>,
}

impl ErrorArgs {
    /// Parses one `tag = expr` pair of the attribute. Each tag may be given once.
    fn parse_tag(&mut self, meta: ParseNestedMeta) -> Result<()> {
        let slot = if meta.path.is_ident("message") {
            &mut self.message
        } else if meta.path.is_ident("labels") {
            &mut self.labels
        } else if meta.path.is_ident("help") {
            &mut self.help
        } else if meta.path.is_ident("note") {
            &mut self.note
        } else {
            return Err(meta.error("unknown tag, expected one of `message`, `labels`, `help`, `note`"));
        };

        if slot.is_some() {
            return Err(meta.error("duplicate tag"));
        }
        *slot = Some(meta.value()?.parse()?);
        Ok(())
    }
}

/// A struct deriving `ErrorKind`, with its parsed `error` attribute.
pub struct ErrorKindTarget {
    pub name: Ident,
    fields: Fields,
    message: Expr,
    labels: Option<Expr>,
    help: Option<Expr>,
    note: Option<Expr>,
}

impl ErrorKindTarget {
    pub fn from_input(input: DeriveInput) -> Result<Self> {
        let Data::Struct(data) = input.data else {
            return Err(syn::Error::new_spanned(&input.ident, "`ErrorKind` can only be derived for structs"));
        };

        let mut args = ErrorArgs::default();
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("error")) {
            attr.parse_nested_meta(|meta| args.parse_tag(meta))?;
        }

        let message = args.message.ok_or_else(|| {
            syn::Error::new_spanned(&input.ident, "expected a `message` tag in the `error` attribute")
        })?;

        Ok(Self {
            name: input.ident,
            fields: data.fields,
            message,
            labels: args.labels,
            help: args.help,
            note: args.note,
        })
    }

    /// Brings the named fields of `self` into scope for the tag expressions.
    fn bind_fields(&self) -> TokenStream2 {
        let name = &self.name;
        match &self.fields {
            Fields::Named(fields) => {
                let idents = fields.named.iter().filter_map(|field| field.ident.as_ref());
                quote! {
                    #[allow(unused_variables)]
                    let #name { #(#idents),* } = self;
                }
            },
            Fields::Unnamed(_) => quote_spanned! { name.span() =>
                compile_error!("`ErrorKind` cannot be derived for tuple structs");
            },
            Fields::Unit => TokenStream2::new(),
        }
    }
}

impl ToTokens for ErrorKindTarget {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let bind_fields = self.bind_fields();
        let message = &self.message;
        let labels = self.labels
            .as_ref()
            .map(|labels| quote! { #labels })
            .unwrap_or_else(|| quote! { Vec::<String>::new() });
        let help = self.help.as_ref().map(|help| quote! { builder.set_help(#help); });
        let note = self.note.as_ref().map(|note| quote! { builder.set_note(#note); });

        tokens.extend(quote! {
            fn message(&self) -> String {
                #bind_fields
                (#message).to_string()
            }

            fn build_report<'a>(
                &self,
                src_id: &'a str,
                spans: &[std::ops::Range<usize>],
            ) -> ariadne::Report<(&'a str, std::ops::Range<usize>)> {
                #bind_fields

                let offset = spans.first().map_or(0, |span| span.start);
                let labels = #labels
                    .into_iter()
                    .zip(spans)
                    .enumerate()
                    .map(|(order, (text, span))| {
                        let text = text.to_string();
                        let label = ariadne::Label::new((src_id, span.clone()))
                            .with_color(pertsym_error::EXPR)
                            .with_order(order as i32);
                        if text.is_empty() {
                            label
                        } else {
                            label.with_message(text)
                        }
                    })
                    .collect::<Vec<_>>();

                #[allow(unused_mut)]
                let mut builder = ariadne::Report::build(ariadne::ReportKind::Error, src_id, offset)
                    .with_message((#message).to_string())
                    .with_labels(labels);
                #help
                #note
                builder.finish()
            }
        });
    }
}
