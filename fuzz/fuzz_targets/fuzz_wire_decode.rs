#![no_main]

//! Fuzz target for the ticket payload decoder.
//!
//! Store rows and sheet payloads arrive as loosely typed JSON. Decoding must
//! never panic, whatever shape the cells take.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};

use ticketdesk::wire;

#[derive(Arbitrary, Debug)]
struct WireInput {
    /// Raw text tried as a whole ticket list
    payload: String,
    id: String,
    status: String,
    created_at: String,
    created_at_millis: i64,
    /// Attachment cell as the sheet stores it
    attachments: String,
    review: String,
}

fuzz_target!(|input: WireInput| {
    if let Ok(Value::Array(values)) = serde_json::from_str::<Value>(&input.payload) {
        let _ = wire::decode_tickets(&values);
    }

    let record = json!({
        "id": input.id,
        "title": "fuzz",
        "status": input.status,
        "priority": input.status,
        "createdAt": input.created_at,
        "startedAt": input.created_at_millis,
        "completedAt": input.created_at,
        "attachments": input.attachments,
        "review": input.review,
    });

    if let Ok(ticket) = wire::decode_ticket(&record) {
        // Whatever decoded must encode and decode again
        let encoded = wire::encode_ticket(&ticket);
        let again = wire::decode_ticket(&encoded).expect("re-decode of encoded ticket");
        assert_eq!(again.id, ticket.id);
        assert_eq!(again.status, ticket.status);
        assert_eq!(wire::encode_ticket(&again), encoded);
    }

    let _ = wire::decode_timestamp(&json!(input.created_at_millis), "fuzz", "createdAt");
    let _ = wire::decode_attachments(&Value::String(input.attachments), "fuzz");
    let _ = wire::decode_review(&Value::String(input.review), "fuzz");
});
