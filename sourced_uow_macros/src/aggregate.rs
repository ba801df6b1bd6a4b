use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn derive_aggregate(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let entity_field = match extract_entity_field(&input) {
        Ok(field) => field,
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl #impl_generics ::sourced_uow::Aggregate for #name #ty_generics #where_clause {
            fn id(&self) -> &str {
                self.#entity_field.id()
            }

            fn uncommitted_events(&self) -> &[::sourced_uow::DomainEvent] {
                self.#entity_field.uncommitted_events()
            }

            fn clear_events(&mut self) {
                self.#entity_field.clear_events()
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_entity_field(input: &DeriveInput) -> syn::Result<syn::Ident> {
    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Aggregate derive only supports structs",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Aggregate derive requires named fields",
        ));
    };

    for field in &fields.named {
        for attr in &field.attrs {
            if !attr.path().is_ident("aggregate") {
                continue;
            }
            let mut is_entity = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("entity") {
                    is_entity = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `entity`"))
                }
            })?;
            if is_entity {
                if let Some(ident) = &field.ident {
                    return Ok(ident.clone());
                }
            }
        }
    }

    // Default: a field named "entity"
    fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == "entity")
        .cloned()
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Aggregate derive: no field marked #[aggregate(entity)] and no field named `entity`",
            )
        })
}
