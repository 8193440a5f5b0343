//! Parsing of `#[bind(...)]` attributes.

use proc_macro2::{Ident, Span};
use quote::{quote, quote_spanned};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Path, Type, meta::ParseNestedMeta};

use crate::rules::ParsedRule;

fn set_once<T>(slot: &mut Option<T>, value: T, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("attribute is specified multiple times"));
    }
    *slot = Some(value);
    Ok(())
}

#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub(crate) form: Option<LitStr>,
    pub(crate) json: Option<LitStr>,
    pub(crate) header: Option<LitStr>,
    pub(crate) binding: Option<LitStr>,
    pub(crate) msg: Option<LitStr>,
    pub(crate) pattern: Option<LitStr>,
    pub(crate) time_format: Option<LitStr>,
    pub(crate) time_utc: bool,
    pub(crate) time_location: Option<LitStr>,
    pub(crate) flatten: bool,
}

impl FieldAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let bind_attrs = attrs.iter().filter(|attr| attr.path().is_ident("bind"));

        let mut this = Self::default();
        for attr in bind_attrs {
            attr.parse_nested_meta(|meta| {
                let slot = if meta.path.is_ident("form") {
                    &mut this.form
                } else if meta.path.is_ident("json") {
                    &mut this.json
                } else if meta.path.is_ident("header") {
                    &mut this.header
                } else if meta.path.is_ident("binding") {
                    &mut this.binding
                } else if meta.path.is_ident("msg") {
                    &mut this.msg
                } else if meta.path.is_ident("pattern") {
                    &mut this.pattern
                } else if meta.path.is_ident("time_format") {
                    &mut this.time_format
                } else if meta.path.is_ident("time_location") {
                    &mut this.time_location
                } else if meta.path.is_ident("time_utc") {
                    this.time_utc = true;
                    return Ok(());
                } else if meta.path.is_ident("flatten") {
                    this.flatten = true;
                    return Ok(());
                } else {
                    let message = "Unsupported attribute; supported attributes are `form`, `json`, `header`, \
                        `binding`, `msg`, `pattern`, `time_format`, `time_utc`, `time_location` and `flatten`";
                    return Err(meta.error(message));
                };
                let value: LitStr = meta.value()?.parse()?;
                set_once(slot, value, &meta)
            })?;
        }
        Ok(this)
    }
}

pub(crate) struct BindField {
    pub(crate) name: Ident,
    pub(crate) ty: Type,
    pub(crate) attrs: FieldAttrs,
    pub(crate) rules: Vec<ParsedRule>,
}

impl BindField {
    fn new(raw: &syn::Field) -> syn::Result<Self> {
        let name = raw.ident.clone().ok_or_else(|| {
            let message = "Only named fields are supported";
            syn::Error::new_spanned(raw, message)
        })?;
        let attrs = FieldAttrs::new(&raw.attrs)?;
        let rules = match &attrs.binding {
            Some(binding) => ParsedRule::parse_chain(binding, attrs.pattern.is_some())?,
            None => vec![],
        };

        if attrs.flatten {
            let has_names = attrs.form.is_some() || attrs.json.is_some() || attrs.header.is_some();
            if has_names || attrs.binding.is_some() {
                let message = "flattened fields cannot have names or rules";
                return Err(syn::Error::new_spanned(&name, message));
            }
        }

        Ok(Self {
            name,
            ty: raw.ty.clone(),
            attrs,
            rules,
        })
    }

    pub(crate) fn span(&self) -> Span {
        self.name.span()
    }
}

#[derive(Default)]
struct ContainerAttrs {
    cr: Option<Path>,
}

impl ContainerAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let bind_attrs = attrs.iter().filter(|attr| attr.path().is_ident("bind"));

        let mut this = Self::default();
        for attr in bind_attrs {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let path: Path = meta.value()?.parse()?;
                    set_once(&mut this.cr, path, &meta)
                } else {
                    Err(meta.error("Unsupported attribute; only `crate` is supported"))
                }
            })?;
        }
        Ok(this)
    }
}

pub(crate) struct BindContainer {
    attrs: ContainerAttrs,
    pub(crate) name: Ident,
    pub(crate) fields: Vec<BindField>,
}

impl BindContainer {
    pub(crate) fn new(raw: &DeriveInput) -> syn::Result<Self> {
        let Data::Struct(data) = &raw.data else {
            let message = "#[derive(Bind)] can only be placed on structs";
            return Err(syn::Error::new_spanned(raw, message));
        };
        if !matches!(data.fields, Fields::Named(_) | Fields::Unit) {
            let message = "#[derive(Bind)] can only be placed on structs with named fields";
            return Err(syn::Error::new_spanned(&data.fields, message));
        }
        if raw.generics.type_params().count() != 0
            || raw.generics.const_params().count() != 0
            || raw.generics.lifetimes().count() != 0
        {
            let message = "generics are not supported";
            return Err(syn::Error::new_spanned(&raw.generics, message));
        }

        let attrs = ContainerAttrs::new(&raw.attrs)?;
        let fields = data
            .fields
            .iter()
            .map(BindField::new)
            .collect::<syn::Result<_>>()?;
        Ok(Self {
            attrs,
            name: raw.ident.clone(),
            fields,
        })
    }

    pub(crate) fn cr(&self, span: Span) -> proc_macro2::TokenStream {
        if let Some(cr) = &self.attrs.cr {
            quote!(#cr)
        } else {
            quote_spanned!(span=> ::smart_bind)
        }
    }
}

pub(crate) fn wrap_in_option(val: Option<proc_macro2::TokenStream>) -> proc_macro2::TokenStream {
    if let Some(val) = val {
        quote!(::core::option::Option::Some(#val))
    } else {
        quote!(::core::option::Option::None)
    }
}
