//! `Bind` derive macro implementation.

use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::{DeriveInput, LitStr, spanned::Spanned};

use crate::utils::{BindContainer, BindField, wrap_in_option};

fn lit_option(lit: Option<&LitStr>) -> proc_macro2::TokenStream {
    wrap_in_option(lit.map(|lit| quote!(#lit)))
}

impl BindField {
    fn describe(&self, parent: &BindContainer) -> proc_macro2::TokenStream {
        let name = &self.name;
        let span = self.span();
        let cr = parent.cr(span);
        let ty = &self.ty;
        let ty_in_code = if let Some(text) = ty.span().source_text() {
            quote!(#text)
        } else {
            quote!(::core::stringify!(#ty))
        };

        let attrs = &self.attrs;
        let form = lit_option(attrs.form.as_ref());
        let json = lit_option(attrs.json.as_ref());
        let header = lit_option(attrs.header.as_ref());
        let msg = lit_option(attrs.msg.as_ref());
        let pattern = lit_option(attrs.pattern.as_ref());
        let time_format = lit_option(attrs.time_format.as_ref());
        let time_location = lit_option(attrs.time_location.as_ref());
        let time_utc = attrs.time_utc;
        let flatten = attrs.flatten;
        let rules = self.rules.iter().map(|rule| {
            let (name, value) = (&rule.name, &rule.value);
            quote!(#cr::rules::Rule::new(#name, #value))
        });

        quote_spanned! {span=>
            #cr::metadata::FieldMetadata {
                rust_name: ::core::stringify!(#name),
                ty: #cr::metadata::RustType::of::<#ty>(#ty_in_code),
                shape: <#ty as #cr::Bind>::shape,
                flatten: #flatten,
                tags: #cr::metadata::FieldTags {
                    form: #form,
                    json: #json,
                    header: #header,
                    binding: &[#(#rules,)*],
                    msg: #msg,
                    pattern: #pattern,
                    time: #cr::metadata::TimeOptions {
                        format: #time_format,
                        utc: #time_utc,
                        location: #time_location,
                    },
                },
            }
        }
    }

    fn validate_rules(&self, parent: &BindContainer) -> proc_macro2::TokenStream {
        let Some(binding) = &self.attrs.binding else {
            return quote!();
        };
        let span = binding.span();
        let cr = parent.cr(span);
        let validations = self.rules.iter().map(|rule| {
            let name = &rule.name;
            quote_spanned! {span=>
                const _: () = #cr::metadata::_private::assert_rule_name(#name);
            }
        });
        quote!(#(#validations)*)
    }
}

impl BindContainer {
    fn derive_describe_params(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let cr = self.cr(name.span());
        let name_str = name.to_string();
        let fields = self.fields.iter().map(|field| field.describe(self));
        let validations = self.fields.iter().map(|field| field.validate_rules(self));

        quote! {
            impl #cr::DescribeParams for #name {
                const DESCRIPTION: #cr::metadata::StructMetadata = #cr::metadata::StructMetadata {
                    ty: #cr::metadata::RustType::of::<#name>(#name_str),
                    fields: &[#(#fields,)*],
                };

                fn metadata() -> &'static #cr::metadata::StructMetadata {
                    static METADATA: #cr::metadata::StructMetadata =
                        <#name as #cr::DescribeParams>::DESCRIPTION;
                    &METADATA
                }
            }

            #(#validations)*
        }
    }

    fn derive_bind(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let cr = self.cr(name.span());
        let match_arms = self.fields.iter().enumerate().map(|(i, field)| {
            let field_name = &field.name;
            quote_spanned! {field.span()=>
                #i => #cr::Bind::bind(&mut self.#field_name, walker, step)
            }
        });

        quote! {
            impl #cr::Bind for #name {
                fn shape() -> #cr::metadata::Shape {
                    #cr::metadata::Shape::Struct(<Self as #cr::DescribeParams>::metadata())
                }

                fn bind(
                    &mut self,
                    walker: &#cr::Walker<'_>,
                    step: &#cr::Step,
                ) -> ::core::result::Result<#cr::Outcome, #cr::BindError> {
                    let metadata = <Self as #cr::DescribeParams>::metadata();
                    walker.bind_struct(step, metadata, &mut |index, step| match index {
                        #(#match_arms,)*
                        _ => ::core::unreachable!("field index out of bounds"),
                    })
                }
            }
        }
    }
}

pub(crate) fn impl_bind(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse(input) {
        Ok(input) => input,
        Err(err) => return err.into_compile_error().into(),
    };
    let container = match BindContainer::new(&input) {
        Ok(container) => container,
        Err(err) => return err.into_compile_error().into(),
    };
    let describe_impl = container.derive_describe_params();
    let bind_impl = container.derive_bind();
    quote!(#describe_impl #bind_impl).into()
}
