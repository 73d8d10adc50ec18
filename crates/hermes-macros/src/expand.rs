//! Code generation for the derives.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr};

use crate::parse::{ContainerAttrs, MemberAttrs};

/// Expands `#[derive(Message)]`.
pub fn expand_message(input: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::parse(&input.attrs)?;
    let krate = &container.krate;
    let ident = &input.ident;
    let type_name = LitStr::new(&ident.to_string(), ident.span());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "Message can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ident,
            "Message can only be derived for structs with named fields",
        ));
    };

    let mut descriptors = Vec::new();
    let mut skipped = Vec::new();
    for field in &fields.named {
        let attrs = MemberAttrs::parse(&field.attrs)?;
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let raw = field_ident.to_string();
        let raw = raw.strip_prefix("r#").unwrap_or(&raw);
        if attrs.skip {
            skipped.push(LitStr::new(raw, field_ident.span()));
            continue;
        }
        let wire = attrs.rename.unwrap_or_else(|| match container.rename_all {
            Some(rule) => rule.apply_to_field(raw),
            None => raw.to_string(),
        });
        let wire = LitStr::new(&wire, field_ident.span());
        let has_default = attrs.default || container.default;
        let ty = &field.ty;

        descriptors.push(quote! {
            #krate::FieldDescriptor::of::<#ty>(#wire, #has_default)
        });
    }

    Ok(quote! {
        impl #impl_generics #krate::Message for #ident #ty_generics #where_clause {
            fn descriptor() -> #krate::TypeDescriptor {
                #krate::TypeDescriptor::new(#type_name, ::std::vec![#(#descriptors),*])
                    .with_skipped(::std::vec![#(#skipped),*])
            }
        }

        impl #impl_generics #krate::FieldType for #ident #ty_generics #where_clause {
            const KIND: #krate::FieldKind = #krate::FieldKind::Structured;
        }
    })
}

/// Expands `#[derive(FieldType)]` for a unit-only enum.
pub fn expand_field_type(input: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::parse(&input.attrs)?;
    let krate = &container.krate;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "FieldType can only be derived for enums; structs derive Message",
        ));
    };

    let mut members = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "only unit variants can be bound as enum members",
            ));
        }
        let attrs = MemberAttrs::parse(&variant.attrs)?;
        if attrs.skip {
            continue;
        }
        let raw = variant.ident.to_string();
        let wire = attrs.rename.unwrap_or_else(|| match container.rename_all {
            Some(rule) => rule.apply_to_variant(&raw),
            None => raw.clone(),
        });
        members.push(LitStr::new(&wire, variant.ident.span()));
    }

    Ok(quote! {
        impl #impl_generics #krate::FieldType for #ident #ty_generics #where_clause {
            const KIND: #krate::FieldKind = #krate::FieldKind::Enum(&[#(#members),*]);
        }
    })
}
