//! Integration test: sign → verify and sign → derive → verify over generated
//! documents and pointer sets.

use proptest::prelude::*;
use proptest::sample::subsequence;
use serde_json::{json, Value};

use ecsd_core::ProofError;
use ecsd_integration_tests::{suite, Issuer};

const KEYS: &[&str] = &["a", "b", "name", "tags", "member of"];

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::sample::select(vec!["a", "b", "x y", "say \"hi\""]).prop_map(|s| json!(s)),
        (0i64..3).prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
    ]
}

fn object(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    prop::collection::btree_map(prop::sample::select(KEYS.to_vec()), inner, 0..4).prop_map(
        |entries| {
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            )
        },
    )
}

/// Nested objects, arrays with repeated scalars, and lists of empty or
/// populated objects.
fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(scalar(), 2..4).prop_map(|items| {
                let first = items[0].clone();
                Value::Array(items.into_iter().chain([first]).collect())
            }),
            prop::collection::vec(
                prop_oneof![Just(json!({})), object(inner.clone())],
                1..4
            )
            .prop_map(Value::Array),
            object(inner),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    object(value()).prop_map(|mut doc| {
        if let Value::Object(map) = &mut doc {
            map.insert("issuer".into(), json!("did:example:university"));
        }
        doc
    })
}

/// Every pointer that resolves to a value below the root.
fn all_pointers(value: &Value, prefix: &str, out: &mut Vec<String>) {
    let mut visit = |token: String, child: &Value| {
        let pointer = format!("{}/{}", prefix, token);
        out.push(pointer.clone());
        all_pointers(child, &pointer, out);
    };
    match value {
        Value::Object(map) => map
            .iter()
            .for_each(|(k, v)| visit(k.replace('~', "~0").replace('/', "~1"), v)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .for_each(|(i, v)| visit(i.to_string(), v)),
        _ => {}
    }
}

fn document_and_pointers() -> impl Strategy<Value = (Value, Vec<String>, Vec<String>)> {
    document().prop_flat_map(|doc| {
        let mut pointers = Vec::new();
        all_pointers(&doc, "", &mut pointers);
        let n = pointers.len();
        (
            Just(doc),
            subsequence(pointers.clone(), 0..=n),
            subsequence(pointers, 0..=n),
        )
    })
}

async fn sign_derive_verify(
    document: &Value,
    mandatory: &[String],
    selective: &[String],
) -> (Result<bool, ProofError>, Result<bool, ProofError>) {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = match suite
        .sign(document, &issuer.keypair, &issuer.verification_method, mandatory)
        .await
    {
        Ok(signed) => signed,
        Err(e) => return (Err(e), Err(ProofError::Logic("not signed".into()))),
    };
    let base = suite.verify(&signed, issuer.resolver()).await;
    let derived = match suite.derive(&signed, selective, None).await {
        Ok(derived) => suite.verify(&derived, issuer.resolver()).await,
        Err(e) => Err(e),
    };
    (base, derived)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_generated_documents_verify(
        (document, mandatory, selective) in document_and_pointers()
    ) {
        // `/issuer` keeps every disclosure non-empty.
        let mandatory: Vec<String> = std::iter::once("/issuer".to_string())
            .chain(mandatory)
            .collect();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (base, derived) =
            runtime.block_on(sign_derive_verify(&document, &mandatory, &selective));

        prop_assert!(
            matches!(base, Ok(true)),
            "base proof: {:?}\ndocument: {}\nmandatory: {:?}",
            base, document, mandatory
        );
        prop_assert!(
            matches!(derived, Ok(true)),
            "derived proof: {:?}\ndocument: {}\nmandatory: {:?}\nselective: {:?}",
            derived, document, mandatory, selective
        );
    }
}
