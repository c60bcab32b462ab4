//! `#[derive(Event)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, Member, Type, parse_macro_input, spanned::Spanned};

/// The field holding the supertype value.
struct ParentField {
    member: Member,
    ty: Type,
}

fn is_parent_field(field: &syn::Field) -> syn::Result<bool> {
    let mut parent = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("event")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                parent = true;
                Ok(())
            } else {
                Err(meta.error("unknown event attribute, expected `parent`"))
            }
        })?;
    }
    Ok(parent)
}

fn find_parent(input: &DeriveInput) -> syn::Result<Option<ParentField>> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(data) => {
            for variant in &data.variants {
                for field in &variant.fields {
                    if is_parent_field(field)? {
                        return Err(syn::Error::new(
                            field.span(),
                            "`#[event(parent)]` is only supported on struct fields",
                        ));
                    }
                }
            }
            return Ok(None);
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "`Event` cannot be derived for unions",
            ));
        }
    };

    let mut found: Option<ParentField> = None;
    let iter: Box<dyn Iterator<Item = &syn::Field>> = match fields {
        Fields::Named(named) => Box::new(named.named.iter()),
        Fields::Unnamed(unnamed) => Box::new(unnamed.unnamed.iter()),
        Fields::Unit => Box::new(std::iter::empty()),
    };
    for (index, field) in iter.enumerate() {
        if !is_parent_field(field)? {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new(
                field.span(),
                "only one field may be marked `#[event(parent)]`",
            ));
        }
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };
        found = Some(ParentField {
            member,
            ty: field.ty.clone(),
        });
    }
    Ok(found)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let parent = find_parent(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fallback = match &parent {
        Some(ParentField { member, .. }) => quote! {
            ::plexus::Event::as_type(&self.#member, ty)
        },
        None => quote! { ::core::option::Option::None },
    };

    let parent_type = parent.as_ref().map(|ParentField { ty, .. }| {
        quote! {
            fn parent_type() -> ::core::option::Option<::plexus::EventType> {
                ::core::option::Option::Some(<#ty as ::plexus::EventKind>::event_type_of())
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::plexus::Event for #name #ty_generics #where_clause {
            fn event_type(&self) -> ::plexus::EventType {
                ::plexus::EventType::of::<Self>()
            }

            fn as_type(
                &self,
                ty: ::std::any::TypeId,
            ) -> ::core::option::Option<&dyn ::std::any::Any> {
                if ty == ::std::any::TypeId::of::<Self>() {
                    ::core::option::Option::Some(self)
                } else {
                    #fallback
                }
            }
        }

        impl #impl_generics ::plexus::EventKind for #name #ty_generics #where_clause {
            #parent_type
        }
    })
}

/// Implementation of `#[derive(Event)]`.
pub fn derive_event_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}
