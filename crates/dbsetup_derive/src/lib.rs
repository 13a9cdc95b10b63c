//! Derive macro for dbsetup test classes.
//!
//! `#[derive(TestClass)]` generates the `TestClass` and `TestInstance` impls of a test struct from its
//! `#[db_setup(...)]` attributes:
//! - field markers: `handle`, `operation`, `binder_config` (spellings come from `dbsetup_core`),
//! - `enclosing`: the back-reference of a nested test class to its enclosing instance,
//! - `extends`: the embedded superclass part,
//! - container forms: `name = "..."`, `skip_next(method, ...)`, `register = path::to::hook`.
//!
//! Marked fields hold `Arc<T>` (or `Option<Arc<T>>`) where `T` implements the collaborator trait of the marker. Any
//! other field type fails to compile at the generated coercion.

use dbsetup_core::lang::markers::{
    self as vocab, ATTRIBUTE, CLASS_NAME_ATTR, DEFAULT_HANDLE_NAME, DEFAULT_ORDER, ENCLOSING_ATTR, EXTENDS_ATTR,
    MarkerId, MarkerTarget, NAME_ARG, ORDER_ARG, REGISTER_ATTR, SOURCES_ARG,
};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Fields, Ident, LitInt, LitStr, Token, Type, parse_macro_input};

/// Generates the descriptor of a dbsetup test class.
///
/// # Example
/// ```ignore
/// #[derive(TestClass)]
/// #[db_setup(skip_next(read_only_query))]
/// struct OrdersTest {
///     #[db_setup(handle)]
///     db: Arc<PgHandle>,
///     #[db_setup(operation(order = 0))]
///     delete_all: Arc<dyn Operation>,
///     #[db_setup(operation)]
///     insert1: Arc<dyn Operation>,
/// }
/// ```
#[proc_macro_derive(TestClass, attributes(db_setup))]
pub fn derive_test_class(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

enum MarkerSpec {
    Handle { name: String },
    Operation { order: i32, sources: Vec<String> },
    BinderConfig { sources: Vec<String> },
}

enum FieldRole {
    Marker(MarkerSpec),
    Enclosing,
    Extends,
}

#[derive(Default)]
struct ContainerAttrs {
    name: Option<String>,
    skip_next: Vec<String>,
    register: Option<syn::Path>,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "generic test classes are not supported"));
    }
    let fields: Vec<&syn::Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(&input.ident, "TestClass requires named fields"));
            }
        },
        _ => return Err(syn::Error::new_spanned(&input.ident, "TestClass can only be derived for structs")),
    };

    let container = parse_container_attrs(input)?;
    let ident = &input.ident;
    let class_name = container.name.unwrap_or_else(|| ident.unraw().to_string());

    let mut members = Vec::new();
    let mut extends: Option<(&Ident, &Type)> = None;
    let mut enclosing: Option<(&Ident, &Type)> = None;
    for field in fields {
        let Some(role) = parse_field_role(field)? else {
            continue;
        };
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        match role {
            FieldRole::Marker(spec) => members.push(member_tokens(field_ident, &field.ty, &spec)),
            FieldRole::Extends => {
                if extends.replace((field_ident, &field.ty)).is_some() {
                    return Err(syn::Error::new_spanned(field_ident, "only one field may be marked `extends`"));
                }
            }
            FieldRole::Enclosing => {
                if enclosing.replace((field_ident, &field.ty)).is_some() {
                    return Err(syn::Error::new_spanned(field_ident, "only one field may be marked `enclosing`"));
                }
            }
        }
    }

    let extends_call = extends.map(|(_, ty)| {
        quote!(.extends(<#ty as ::dbsetup::reflect::TestClass>::class_info()))
    });
    let nested_call = enclosing.map(|(_, ty)| {
        quote!(.nested_in(<<#ty as ::dbsetup::reflect::EnclosingRef>::Target as ::dbsetup::reflect::TestClass>::class_info()))
    });
    let skip_calls = container.skip_next.iter().map(|method| quote!(.skip_next(#method)));
    let register = container.register.map(|hook| quote!(let builder = #hook(builder);));

    let superclass_view = match extends {
        Some((field, _)) => quote!(::dbsetup::reflect::TestInstance::as_class(&self.#field, class)),
        None => quote!(::std::option::Option::None),
    };
    let enclosing_fn = enclosing.map(|(field, _)| {
        quote! {
            fn enclosing_instance(&self) -> ::std::option::Option<&dyn ::dbsetup::reflect::TestInstance> {
                ::std::option::Option::Some(::dbsetup::reflect::EnclosingRef::enclosing(&self.#field))
            }
        }
    });

    Ok(quote! {
        impl ::dbsetup::reflect::TestClass for #ident {
            fn class_info() -> ::std::sync::Arc<::dbsetup::reflect::ClassInfo> {
                static INFO: ::std::sync::OnceLock<::std::sync::Arc<::dbsetup::reflect::ClassInfo>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(INFO.get_or_init(|| {
                    let builder = ::dbsetup::reflect::ClassInfo::builder::<Self>(#class_name)
                        #extends_call
                        #nested_call
                        #(#members)*
                        #(#skip_calls)*;
                    #register
                    builder.build()
                }))
            }
        }

        impl ::dbsetup::reflect::TestInstance for #ident {
            fn class_id(&self) -> ::dbsetup::reflect::ClassId {
                ::dbsetup::reflect::ClassId::of::<Self>()
            }

            fn instance_class(&self) -> ::std::sync::Arc<::dbsetup::reflect::ClassInfo> {
                <Self as ::dbsetup::reflect::TestClass>::class_info()
            }

            fn as_class(&self, class: ::dbsetup::reflect::ClassId) -> ::std::option::Option<&dyn ::std::any::Any> {
                if class == ::dbsetup::reflect::ClassId::of::<Self>() {
                    return ::std::option::Option::Some(self as &dyn ::std::any::Any);
                }
                #superclass_view
            }

            #enclosing_fn
        }
    })
}

fn member_tokens(field: &Ident, ty: &Type, spec: &MarkerSpec) -> TokenStream2 {
    let member_name = field.unraw().to_string();
    let (declared, marker, collaborator, variant) = match spec {
        MarkerSpec::Handle { name } => (
            quote!(connection_handle),
            quote!(::dbsetup::reflect::Marker::Handle(::dbsetup::reflect::HandleMarker::named(#name))),
            quote!(::dbsetup::collaborators::ConnectionHandle),
            quote!(Handle),
        ),
        MarkerSpec::Operation { order, sources } => (
            quote!(operation),
            quote!(::dbsetup::reflect::Marker::Operation(::dbsetup::reflect::OperationMarker::new(
                #order,
                ::std::vec![#(::std::string::String::from(#sources)),*],
            ))),
            quote!(::dbsetup::collaborators::Operation),
            quote!(Operation),
        ),
        MarkerSpec::BinderConfig { sources } => (
            quote!(binder_config),
            quote!(::dbsetup::reflect::Marker::BinderConfig(::dbsetup::reflect::BinderConfigMarker::new(
                ::std::vec![#(::std::string::String::from(#sources)),*],
            ))),
            quote!(::dbsetup::collaborators::BinderConfig),
            quote!(BinderConfig),
        ),
    };

    let read = if is_option(ty) {
        quote! {
            match &this.#field {
                ::std::option::Option::Some(inner) => {
                    let value: ::std::sync::Arc<dyn #collaborator> = inner.clone();
                    ::std::option::Option::Some(::dbsetup::reflect::Value::#variant(value))
                }
                ::std::option::Option::None => ::std::option::Option::None,
            }
        }
    } else {
        quote! {{
            let value: ::std::sync::Arc<dyn #collaborator> = this.#field.clone();
            ::std::option::Option::Some(::dbsetup::reflect::Value::#variant(value))
        }}
    };

    quote! {
        .field(::dbsetup::reflect::MemberInfo::instance_field::<Self, _>(
            #member_name,
            ::dbsetup::reflect::DeclaredType::#declared::<#ty>(),
            [#marker],
            |this: &Self| #read,
        ))
    }
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path.qself.is_none() && path.path.segments.last().is_some_and(|seg| seg.ident == "Option"),
        _ => false,
    }
}

fn parse_container_attrs(input: &DeriveInput) -> syn::Result<ContainerAttrs> {
    let mut attrs = ContainerAttrs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            let key = meta_key(&meta)?;
            if key == CLASS_NAME_ATTR {
                attrs.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if key == REGISTER_ATTR {
                attrs.register = Some(meta.value()?.parse::<syn::Path>()?);
            } else if vocab::from_str(&key) == Some(MarkerId::SkipNext) {
                meta.parse_nested_meta(|method| {
                    attrs.skip_next.push(meta_key(&method)?);
                    Ok(())
                })?;
            } else {
                return Err(meta.error(format!("unsupported container attribute `{key}`")));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_field_role(field: &syn::Field) -> syn::Result<Option<FieldRole>> {
    let mut role: Option<FieldRole> = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE)) {
        attr.parse_nested_meta(|meta| {
            let key = meta_key(&meta)?;
            let parsed = if key == ENCLOSING_ATTR {
                FieldRole::Enclosing
            } else if key == EXTENDS_ATTR {
                FieldRole::Extends
            } else {
                let id = vocab::from_str(&key).ok_or_else(|| meta.error(format!("unknown marker `{key}`")))?;
                if vocab::target(id) != MarkerTarget::Field {
                    return Err(meta.error(format!(
                        "`{}` applies to test methods; list the method in `#[{ATTRIBUTE}({}(...))]` on the struct",
                        vocab::as_str(id),
                        vocab::as_str(id)
                    )));
                }
                FieldRole::Marker(parse_marker(id, &meta)?)
            };
            if role.replace(parsed).is_some() {
                return Err(meta.error("a field carries at most one db_setup marker"));
            }
            Ok(())
        })?;
    }
    Ok(role)
}

fn parse_marker(id: MarkerId, meta: &ParseNestedMeta<'_>) -> syn::Result<MarkerSpec> {
    let mut name = DEFAULT_HANDLE_NAME.to_string();
    let mut order = DEFAULT_ORDER;
    let mut sources = vec![DEFAULT_HANDLE_NAME.to_string()];

    if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|arg| {
            let key = meta_key(&arg)?;
            if !vocab::args(id).contains(&key.as_str()) {
                return Err(arg.error(format!("`{}` does not accept `{key}`", vocab::as_str(id))));
            }
            if key == NAME_ARG {
                name = arg.value()?.parse::<LitStr>()?.value();
            } else if key == ORDER_ARG {
                order = parse_order(arg.value()?)?;
            } else if key == SOURCES_ARG {
                sources = parse_sources(arg.value()?)?;
            }
            Ok(())
        })?;
    }

    Ok(match id {
        MarkerId::Handle => MarkerSpec::Handle { name },
        MarkerId::Operation => MarkerSpec::Operation { order, sources },
        MarkerId::BinderConfig => MarkerSpec::BinderConfig { sources },
        MarkerId::SkipNext => return Err(meta.error("`skip_next` is not a field marker")),
    })
}

fn meta_key(meta: &ParseNestedMeta<'_>) -> syn::Result<String> {
    meta.path
        .get_ident()
        .map(|ident| ident.unraw().to_string())
        .ok_or_else(|| meta.error("expected an identifier"))
}

fn parse_order(input: ParseStream<'_>) -> syn::Result<i32> {
    let negative = input.peek(Token![-]);
    if negative {
        input.parse::<Token![-]>()?;
    }
    let lit: LitInt = input.parse()?;
    let value: i64 = lit.base10_parse()?;
    let value = if negative { -value } else { value };
    i32::try_from(value).map_err(|_| syn::Error::new(lit.span(), "order must fit in an i32"))
}

/// `"A"` or `["A", "B"]`.
fn parse_sources(input: ParseStream<'_>) -> syn::Result<Vec<String>> {
    if input.peek(syn::token::Bracket) {
        let content;
        syn::bracketed!(content in input);
        let items = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
        Ok(items.iter().map(LitStr::value).collect())
    } else {
        Ok(vec![input.parse::<LitStr>()?.value()])
    }
}
