use std::collections::HashSet;

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Path, Token, Visibility,
    ext::IdentExt,
    parse::{Parse, ParseStream, Result},
};

// ─── Macro arguments ─────────────────────────────────────────────────────────

/// Parsed `(crate = path)` argument list.
pub struct MacroArgs {
    krate: Path,
}

impl Parse for MacroArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut krate: Path = syn::parse_quote!(::girder);
        while !input.is_empty() {
            let key = Ident::parse_any(input)?;
            if key != "crate" {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown argument `{key}`; expected `crate = path`"),
                ));
            }
            input.parse::<Token![=]>()?;
            krate = input.parse()?;
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(Self { krate })
    }
}

/// Controller method names the binder reserves for `init`/`shut`.
const LIFECYCLE_NAMES: [&str; 2] = ["Init", "Shut"];

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Object,
    Controller,
}

// ─── Method attributes ───────────────────────────────────────────────────────

/// Options from `#[girder(...)]` on a single method.
#[derive(Default)]
struct MethodOpts {
    name: Option<LitStr>,
    skip: bool,
}

/// Parses and removes every `#[girder(...)]` attribute of a method.
fn take_method_opts(method: &mut ImplItemFn) -> Result<MethodOpts> {
    let mut opts = MethodOpts::default();
    let mut result = Ok(());
    method.attrs.retain(|attr| {
        if !attr.path().is_ident("girder") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                opts.skip = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                opts.name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown girder attribute; expected `name` or `skip`"))
            }
        });
        if let Err(err) = parsed {
            result = Err(err);
        }
        false
    });
    result.map(|_| opts)
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// `get_user_list` → `GetUserList`.
fn upper_camel(ident: &Ident) -> String {
    ident
        .unraw()
        .to_string()
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// How a method's receiver borrows `self`, if it borrows at all.
enum Receiver {
    Shared,
    Exclusive,
}

/// Returns the receiver kind when `method` has the shape of a routable
/// method: a borrowed receiver plus exactly one argument and no type
/// parameters.
fn routable_receiver(method: &ImplItemFn) -> Option<Receiver> {
    let sig = &method.sig;
    if sig.inputs.len() != 2 || sig.generics.type_params().next().is_some() {
        return None;
    }
    match sig.inputs.first()? {
        FnArg::Receiver(r) if r.reference.is_some() && r.mutability.is_some() => {
            Some(Receiver::Exclusive)
        }
        FnArg::Receiver(r) if r.reference.is_some() => Some(Receiver::Shared),
        _ => None,
    }
}

/// One method that goes into the table.
struct Entry {
    name: String,
    method: Ident,
    wrapper: Ident,
    is_async: bool,
}

// ─── Code generation ──────────────────────────────────────────────────────────

pub fn expand(kind: TableKind, args: MacroArgs, mut input: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "expected an inherent impl block, not a trait impl",
        ));
    }

    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let opts = take_method_opts(method)?;
        if opts.skip {
            continue;
        }

        let is_pub = matches!(method.vis, Visibility::Public(_));
        let receiver = if is_pub { routable_receiver(method) } else { None };
        let receiver = match (receiver, &opts.name) {
            (Some(r), _) => r,
            (None, None) => continue,
            (None, Some(name)) => {
                return Err(syn::Error::new(
                    name.span(),
                    "only `pub` methods taking `&self` and a request can be named",
                ));
            }
        };
        if kind == TableKind::Object && matches!(receiver, Receiver::Exclusive) {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "object methods are shared between requests and must take `&self`; \
                 use #[controller] for per-request state",
            ));
        }

        let name = match &opts.name {
            Some(lit) => lit.value(),
            None => upper_camel(&method.sig.ident),
        };
        if name.is_empty() {
            return Err(syn::Error::new_spanned(&method.sig.ident, "empty method name"));
        }
        if kind == TableKind::Controller
            && LIFECYCLE_NAMES.iter().any(|l| l.eq_ignore_ascii_case(&name))
        {
            return Err(syn::Error::new_spanned(
                &method.sig.ident,
                format!(
                    "`{name}` is reserved for controller lifecycle callbacks; \
                     implement `init`/`shut` in `impl Controller`, or mark this \
                     method #[girder(skip)]"
                ),
            ));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(syn::Error::new_spanned(
                &method.sig.ident,
                format!("duplicate method name `{name}`"),
            ));
        }

        let ident = method.sig.ident.unraw();
        entries.push(Entry {
            name,
            method: method.sig.ident.clone(),
            wrapper: match kind {
                TableKind::Object => format_ident!("__girder_object_{}", ident),
                TableKind::Controller => format_ident!("__girder_controller_{}", ident),
            },
            is_async: method.sig.asyncness.is_some(),
        });
    }

    let krate = &args.krate;
    let p = quote! { #krate::__private };
    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let wrappers = entries.iter().map(|e| {
        let Entry {
            method,
            wrapper,
            is_async,
            ..
        } = e;
        let await_tok = is_async.then(|| quote! { .await });
        match kind {
            TableKind::Object => quote! {
                #[doc(hidden)]
                fn #wrapper(
                    this: #p::Arc<Self>,
                    req: #p::Arc<#p::Request>,
                ) -> #p::BoxFuture<'static, ()> {
                    #p::Box::pin(async move {
                        let res = Self::#method(&*this, #p::Arc::clone(&req)) #await_tok;
                        #p::IntoResponse::write_to(res, &req);
                    })
                }
            },
            TableKind::Controller => quote! {
                #[doc(hidden)]
                fn #wrapper<'__girder>(
                    this: &'__girder mut Self,
                    req: #p::Arc<#p::Request>,
                ) -> #p::BoxFuture<'__girder, ()> {
                    #p::Box::pin(async move {
                        let res = Self::#method(this, #p::Arc::clone(&req)) #await_tok;
                        #p::IntoResponse::write_to(res, &req);
                    })
                }
            },
        }
    });

    let (table_trait, table_entry) = match kind {
        TableKind::Object => (quote! { ObjectMethods }, quote! { ObjectMethod }),
        TableKind::Controller => (quote! { ControllerMethods }, quote! { ControllerMethod }),
    };
    let table = entries.iter().map(|e| {
        let name = LitStr::new(&e.name, Span::call_site());
        let wrapper = &e.wrapper;
        quote! {
            #p::#table_entry {
                name: #name,
                call: Self::#wrapper,
            }
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics #self_ty #where_clause {
            #( #wrappers )*
        }

        impl #impl_generics #p::#table_trait for #self_ty #where_clause {
            const METHODS: &'static [#p::#table_entry<Self>] = &[ #( #table ),* ];
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_camel() {
        let cases = [
            ("get_user_list", "GetUserList"),
            ("index", "Index"),
            ("post", "Post"),
            ("r#type", "Type"),
            ("_private_ish", "PrivateIsh"),
        ];
        for (input, expected) in cases {
            let ident: Ident = syn::parse_str(input).unwrap();
            assert_eq!(upper_camel(&ident), expected);
        }
    }

    #[test]
    fn test_routable_receiver() {
        let shared: ImplItemFn = syn::parse_quote! {
            pub fn show(&self, req: Arc<Request>) {}
        };
        let exclusive: ImplItemFn = syn::parse_quote! {
            pub async fn add(&mut self, req: Arc<Request>) {}
        };
        let no_request: ImplItemFn = syn::parse_quote! {
            pub fn len(&self) -> usize { 0 }
        };
        let constructor: ImplItemFn = syn::parse_quote! {
            pub fn new(req: Arc<Request>) -> Self { todo!() }
        };
        assert!(matches!(routable_receiver(&shared), Some(Receiver::Shared)));
        assert!(matches!(routable_receiver(&exclusive), Some(Receiver::Exclusive)));
        assert!(routable_receiver(&no_request).is_none());
        assert!(routable_receiver(&constructor).is_none());
    }

    #[test]
    fn test_method_attrs_are_stripped() {
        let mut method: ImplItemFn = syn::parse_quote! {
            #[inline]
            #[girder(name = "Index")]
            pub fn home(&self, req: Arc<Request>) {}
        };
        let opts = take_method_opts(&mut method).unwrap();
        assert_eq!(opts.name.unwrap().value(), "Index");
        assert!(!opts.skip);
        assert_eq!(method.attrs.len(), 1);
    }

    #[test]
    fn test_object_rejects_mut_receiver() {
        let input: ItemImpl = syn::parse_quote! {
            impl Api {
                pub fn add(&mut self, req: Arc<Request>) {}
            }
        };
        let args: MacroArgs = syn::parse_str("").unwrap();
        assert!(expand(TableKind::Object, args, input).is_err());
    }

    #[test]
    fn test_controller_rejects_lifecycle_names() {
        let input: ItemImpl = syn::parse_quote! {
            impl Page {
                pub fn init(&mut self, req: Arc<Request>) {}
            }
        };
        let args: MacroArgs = syn::parse_str("").unwrap();
        let err = expand(TableKind::Controller, args, input).unwrap_err();
        assert!(err.to_string().contains("lifecycle"));

        let renamed: ItemImpl = syn::parse_quote! {
            impl Page {
                #[girder(name = "SHUT")]
                pub fn close(&mut self, req: Arc<Request>) {}
            }
        };
        let args: MacroArgs = syn::parse_str("").unwrap();
        assert!(expand(TableKind::Controller, args, renamed).is_err());

        let object: ItemImpl = syn::parse_quote! {
            impl Api {
                pub fn init(&self, req: Arc<Request>) {}
            }
        };
        let args: MacroArgs = syn::parse_str("").unwrap();
        assert!(expand(TableKind::Object, args, object).is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let input: ItemImpl = syn::parse_quote! {
            impl Api {
                pub fn show(&self, req: Arc<Request>) {}
                #[girder(name = "show")]
                pub fn display(&self, req: Arc<Request>) {}
            }
        };
        let args: MacroArgs = syn::parse_str("crate = girder_core").unwrap();
        assert!(expand(TableKind::Controller, args, input).is_err());
    }
}
