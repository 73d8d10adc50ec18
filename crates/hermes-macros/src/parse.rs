//! Attribute parsing for the derives.
//!
//! Only the serde attributes that change a field's wire name or
//! requiredness are interpreted; everything else is skipped.

use syn::{meta::ParseNestedMeta, parenthesized, Attribute, Expr, LitStr, Path};

use crate::rename::RenameRule;

/// Container-level attributes.
#[derive(Debug)]
pub struct ContainerAttrs {
    /// serde `rename_all` (deserialize side).
    pub rename_all: Option<RenameRule>,
    /// serde container `default`.
    pub default: bool,
    /// Path of the core crate in generated code.
    pub krate: Path,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut rename_all = None;
        let mut default = false;
        let mut krate: Path = syn::parse_quote!(::hermes_core);

        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") {
                        if let Some(rule) = deserialize_name(&meta)? {
                            rename_all = Some(RenameRule::parse(&rule.value()).ok_or_else(|| {
                                syn::Error::new(rule.span(), "unknown rename_all rule")
                            })?);
                        }
                    } else if meta.path.is_ident("default") {
                        default = true;
                        skip_value(&meta)?;
                    } else if meta.path.is_ident("tag")
                        || meta.path.is_ident("untagged")
                        || meta.path.is_ident("content")
                    {
                        return Err(meta.error("internally tagged messages are not supported"));
                    } else {
                        skip_value(&meta)?;
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("message") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("crate") {
                        let lit: LitStr = meta.value()?.parse()?;
                        krate = lit.parse()?;
                        Ok(())
                    } else {
                        Err(meta.error("unknown message attribute"))
                    }
                })?;
            }
        }

        Ok(Self {
            rename_all,
            default,
            krate,
        })
    }
}

/// Field- or variant-level attributes.
#[derive(Debug, Default)]
pub struct MemberAttrs {
    /// serde `rename` (deserialize side).
    pub rename: Option<String>,
    /// serde `default` on the field.
    pub default: bool,
    /// serde `skip` / `skip_deserializing`.
    pub skip: bool,
}

impl MemberAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if let Some(name) = deserialize_name(&meta)? {
                        out.rename = Some(name.value());
                    }
                } else if meta.path.is_ident("default") {
                    out.default = true;
                    skip_value(&meta)?;
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
                    out.skip = true;
                } else if meta.path.is_ident("flatten") {
                    return Err(meta.error("flattened fields cannot be described; list them explicitly"));
                } else {
                    skip_value(&meta)?;
                }
                Ok(())
            })?;
        }

        Ok(out)
    }
}

/// Reads `key = "x"` or `key(deserialize = "x", ...)`.
fn deserialize_name(meta: &ParseNestedMeta<'_>) -> syn::Result<Option<LitStr>> {
    if meta.input.peek(syn::Token![=]) {
        return meta.value()?.parse().map(Some);
    }

    let mut found = None;
    meta.parse_nested_meta(|inner| {
        let lit: LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("deserialize") {
            found = Some(lit);
        }
        Ok(())
    })?;
    Ok(found)
}

/// Consumes the value of an attribute we do not interpret.
fn skip_value(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}
