use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, spanned::Spanned, FnArg, GenericArgument, Ident, ItemFn, Pat, PathArguments,
    Signature, Type,
};

/// Transform an asynchronous test into a synchronous one, inject dependencies,
/// and ensure that the database is dropped regardless of how the test terminates.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// [`mongodb::Database`], `crate::model::api::auth::Bearer` (only when logged in),
/// and `crate::model::mongodb::Coll<T>`.
///
/// `#[backend_test(student)]` and `#[backend_test(management)]` register and log
/// in a user of that role before the test body runs.
///
/// These tests need a live MongoDB instance, so they only run when the calling
/// crate is built with its `db-tests` feature.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let sig = match check_sig(item_fn.sig.clone()) {
        Ok(sig) => sig,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };
    let TestSig {
        args: test_args,
        collection_idents,
        collection_types,
        wants_bearer,
    } = sig;

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Log in the client as a student/manager if needed.
    let login_as = parse_macro_input!(args as Option<Ident>);
    let example = match login_as {
        Some(ref role) if role == "student" => Some(quote! { example_student }),
        Some(ref role) if role == "management" => Some(quote! { example_manager }),
        Some(ref role) => {
            return syn::Error::new(role.span(), "Expected `student` or `management`")
                .into_compile_error()
                .into();
        }
        None => None,
    };
    if wants_bearer && example.is_none() {
        return syn::Error::new(
            item_fn.sig.span(),
            "A `Bearer` can only be injected into logged-in tests",
        )
        .into_compile_error()
        .into();
    }
    let maybe_login = example
        .map(|example| {
            quote! {
                let credentials = crate::model::api::auth::RegisterRequest::#example();
                let response = rocket_client
                    .post("/api/auth/register")
                    .header(rocket::http::ContentType::JSON)
                    .body(rocket::serde::json::serde_json::to_string(&credentials).unwrap())
                    .dispatch()
                    .await;
                assert_eq!(response.status(), rocket::http::Status::Created);
                let session: crate::model::api::auth::TokenResponse =
                    response.into_json().await.unwrap();
                Some(crate::model::api::auth::Bearer::new(session.access_token))
            }
        })
        .unwrap_or_else(|| quote! { None });

    // Rewrite the test function.
    quote! {
        #[test]
        #[cfg_attr(not(feature = "db-tests"), ignore = "requires a running MongoDB instance")]
        fn #name() {
            /// Test setup.
            async fn setup() -> (
                rocket::local::asynchronous::Client,
                mongodb::Database,
                Option<crate::model::api::auth::Bearer>,
            ) {
                let db_client = crate::db_client().await;
                let db_name = crate::database();
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_db(db_client.clone(), &db_name).await,
                )
                .await
                .unwrap();
                let db = db_client.database(&db_name);

                let bearer = { #maybe_login };

                (rocket_client, db, bearer)
            }

            /// The test itself.
            #item_fn

            /// Test cleanup.
            async fn cleanup(db: mongodb::Database) {
                db.drop(None).await.unwrap();
            }

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let (rocket_client, db, bearer) = outer_runtime.block_on(setup());

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let db_mutex = std::sync::Mutex::new(db.clone());
            let bearer_mutex = std::sync::Mutex::new(bearer);
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                let rocket_client = client_mutex.into_inner().unwrap();
                let db = db_mutex.into_inner().unwrap();
                #[allow(unused_variables)]
                let bearer = bearer_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                #(
                    let #collection_idents = crate::model::mongodb::Coll::<#collection_types>::from_db(&db);
                )*

                runtime.block_on(#new_name(#(#test_args),* #(,#collection_idents)*));
            });

            // Run the cleanup.
            outer_runtime.block_on(cleanup(db));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

/// The injectable parts of a test signature.
struct TestSig {
    args: Vec<TokenStream2>,
    collection_idents: Vec<Ident>,
    collection_types: Vec<Ident>,
    wants_bearer: bool,
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<TestSig, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_db = false;
    let mut has_bearer = false;
    let mut args = vec![];
    let mut collection_idents = vec![];
    let mut collection_types = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(pat_ident) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(type_ident) = type_path.path.get_ident() {
                        if type_ident == "Client" {
                            if has_client {
                                return Err(syn::Error::new(input.span(), "Test cannot accept more than one `rocket::local::asynchronous::Client`"));
                            }
                            has_client = true;
                            args.push(quote! { rocket_client });
                            continue;
                        } else if type_ident == "Database" {
                            if has_db {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `mongodb::Database`",
                                ));
                            }
                            has_db = true;
                            args.push(quote! { db });
                            continue;
                        } else if type_ident == "Bearer" {
                            if has_bearer {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `Bearer`",
                                ));
                            }
                            has_bearer = true;
                            args.push(quote! { bearer.clone().unwrap() });
                            continue;
                        }
                    } else {
                        // Valid as the last path segment for any type is itself
                        let possible_collection = type_path.path.segments.last().unwrap();
                        if possible_collection.ident == "Coll" {
                            if let PathArguments::AngleBracketed(generics) =
                                &possible_collection.arguments
                            {
                                if let Some(GenericArgument::Type(Type::Path(type_path))) =
                                    generics.args.first()
                                {
                                    if let Some(type_ident) = type_path.path.get_ident() {
                                        collection_idents.push(pat_ident.ident.clone());
                                        collection_types.push(type_ident.clone());
                                        continue;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `db_ident: Database`, `bearer_ident: Bearer` or `collection_ident: Coll<T>`",
        ));
    }

    Ok(TestSig {
        args,
        collection_idents,
        collection_types,
        wants_bearer: has_bearer,
    })
}
