//! `#[derive(Injectable)]` implementation.

use darling::ast::Data;
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, GenericArgument, PathArguments, Type, parse_macro_input};

#[derive(Debug, Clone, Copy, FromMeta)]
enum ScopeArg {
    #[darling(rename = "singleton")]
    Singleton,
    #[darling(rename = "request")]
    Request,
}

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<Ignored, InjectField>,
    #[darling(default)]
    scope: Option<ScopeArg>,
    #[darling(default)]
    on_request: bool,
    #[darling(multiple)]
    expose: Vec<Type>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<syn::Ident>,
    ty: Type,
    #[darling(default)]
    token: Option<String>,
    #[darling(default)]
    skip: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let parsed = match InjectableInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors().into(),
    };

    match expand(parsed) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: InjectableInput) -> syn::Result<TokenStream2> {
    let InjectableInput {
        ident,
        generics,
        data,
        scope,
        on_request,
        expose,
    } = input;

    let fields = match data {
        Data::Struct(fields) => fields.fields,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(&ident, "Injectable can only be derived for structs"));
        }
    };

    let mut params = Vec::new();
    let mut inits = Vec::new();

    for field in &fields {
        let Some(name) = &field.ident else {
            return Err(syn::Error::new_spanned(&field.ty, "Injectable requires named fields"));
        };

        if field.skip {
            if field.token.is_some() {
                return Err(syn::Error::new_spanned(
                    name,
                    "#[inject(skip)] cannot be combined with a token",
                ));
            }
            inits.push(quote! { #name: ::core::default::Default::default() });
            continue;
        }

        let inner = arc_inner(&field.ty).ok_or_else(|| {
            syn::Error::new_spanned(
                &field.ty,
                "injected fields must be `Arc<T>`; mark other fields #[inject(skip)]",
            )
        })?;

        params.push(match &field.token {
            Some(token) => quote! { meta.param_token::<#inner>(#token); },
            None => quote! { meta.param::<#inner>(); },
        });
        inits.push(quote! { #name: args.take::<#inner>()? });
    }

    let scope = scope.map(|scope| match scope {
        ScopeArg::Singleton => quote! { meta.scope(::ulagich::Scope::Singleton); },
        ScopeArg::Request => quote! { meta.scope(::ulagich::Scope::Request); },
    });

    let hook = on_request.then(|| quote! { caps.request_initializable(); });

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #[::ulagich::async_trait]
        impl #impl_generics ::ulagich::Injectable for #ident #ty_generics #where_clause {
            fn annotate(meta: &mut ::ulagich::Annotations) {
                #(#params)*
                #scope
            }

            fn capabilities(caps: &mut ::ulagich::Capabilities<Self>) {
                #(caps.expose::<#expose>(|this| this);)*
                #hook
            }

            #[allow(unused_mut, unused_variables)]
            async fn construct(
                mut args: ::ulagich::Arguments,
            ) -> ::core::result::Result<Self, ::ulagich::BoxError> {
                ::core::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }
    })
}

/// `T` of an `Arc<T>` field type.
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }

    let segment = path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: TokenStream2) -> InjectableInput {
        let input: DeriveInput = syn::parse2(input).unwrap();
        InjectableInput::from_derive_input(&input).unwrap()
    }

    #[test]
    fn arc_inner_extracts_payload() {
        let ty: Type = syn::parse_quote!(std::sync::Arc<dyn Logger>);
        let inner = arc_inner(&ty).unwrap();
        assert_eq!(quote!(#inner).to_string(), quote!(dyn Logger).to_string());
    }

    #[test]
    fn arc_inner_rejects_other_types() {
        let ty: Type = syn::parse_quote!(Box<Clock>);
        assert!(arc_inner(&ty).is_none());

        let ty: Type = syn::parse_quote!(u32);
        assert!(arc_inner(&ty).is_none());
    }

    #[test]
    fn parses_struct_attributes() {
        let parsed = parse(quote! {
            #[injectable(scope = "request", on_request, expose = "dyn Auditor", expose = "dyn Named")]
            struct Handler {
                clock: Arc<Clock>,
            }
        });

        assert!(matches!(parsed.scope, Some(ScopeArg::Request)));
        assert!(parsed.on_request);
        assert_eq!(parsed.expose.len(), 2);
    }

    #[test]
    fn parses_field_attributes() {
        let parsed = parse(quote! {
            struct Handler {
                #[inject(token = "Logger")]
                logger: Arc<dyn Logger>,
                #[inject(skip)]
                hits: u64,
            }
        });

        let fields = parsed.data.take_struct().unwrap().fields;
        assert_eq!(fields[0].token.as_deref(), Some("Logger"));
        assert!(fields[1].skip);
    }

    #[test]
    fn expansion_declares_parameters_in_order() {
        let expanded = expand(parse(quote! {
            struct Handler {
                clock: Arc<Clock>,
                #[inject(token = "Logger")]
                logger: Arc<dyn Logger>,
            }
        }))
        .unwrap()
        .to_string();

        let clock = expanded.find("param :: < Clock >").unwrap();
        let logger = expanded.find("param_token :: < dyn Logger > (\"Logger\")").unwrap();
        assert!(clock < logger);
    }

    #[test]
    fn non_arc_field_is_rejected() {
        let err = expand(parse(quote! {
            struct Handler {
                count: u32,
            }
        }))
        .err()
        .unwrap();

        assert!(err.to_string().contains("Arc<T>"));
    }

    #[test]
    fn enums_are_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            enum Handler { A, B }
        };
        assert!(InjectableInput::from_derive_input(&input).is_err());
    }
}
