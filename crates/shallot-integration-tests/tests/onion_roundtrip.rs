//! Integration test: circuit selection, layering and peeling without I/O.
//!
//! Exercises the full path a message takes through the protocol:
//! 1. Relays generate keypairs and publish identities to a directory
//! 2. A user samples a 3-hop circuit from a directory snapshot
//! 3. The user wraps the message once per hop, innermost first
//! 4. Each relay peels its own layer and learns only the next port
//! 5. The exit relay recovers the plaintext and the destination port

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shallot_crypto::x25519::X25519StaticSecret;
use shallot_onion::circuit::CircuitBuilder;
use shallot_onion::directory::{InMemoryDirectory, KeyDirectory};
use shallot_onion::layer::{OnionEncoder, SymmetricKey};
use shallot_onion::relay::RelayKeys;
use shallot_onion::{OnionError, ADDRESS_WIDTH, ENCRYPTED_KEY_LEN};
use shallot_types::network::PortLayout;
use shallot_types::NodeId;

/// Start `count` relays and register each with a fresh directory.
fn relay_network(count: u32) -> (HashMap<NodeId, RelayKeys>, InMemoryDirectory) {
    let directory = InMemoryDirectory::new();
    let relays: HashMap<NodeId, RelayKeys> = (0..count)
        .map(|id| (id, RelayKeys::generate(id)))
        .collect();
    for relay in relays.values() {
        directory.register(relay.identity()).expect("register");
    }
    (relays, directory)
}

#[test]
fn message_survives_three_hops() {
    let (relays, directory) = relay_network(6);
    let layout = PortLayout::default();
    let destination = layout.user_port(2).expect("port");

    let mut builder = CircuitBuilder::with_rng(StdRng::seed_from_u64(7));
    let circuit = builder.build(&directory.list()).expect("circuit");

    let mut message = OnionEncoder::new(layout)
        .encode("Hello World!", destination, &circuit)
        .expect("encode");

    let ids = circuit.node_ids();
    let expected_ports = [
        layout.node_port(ids[1]).expect("port"),
        layout.node_port(ids[2]).expect("port"),
        destination,
    ];

    for (id, expected) in ids.iter().zip(expected_ports) {
        let peeled = relays[id].peel(&message).expect("peel");
        assert_eq!(peeled.destination_port, expected);
        message = peeled.remainder;
    }
    assert_eq!(message, "Hello World!");
}

#[test]
fn relays_cannot_peel_out_of_order() {
    let (relays, directory) = relay_network(3);
    let circuit = CircuitBuilder::with_rng(StdRng::seed_from_u64(1))
        .build(&directory.list())
        .expect("circuit");
    let onion = OnionEncoder::new(PortLayout::default())
        .encode("secret", 3001, &circuit)
        .expect("encode");

    // Only the entry relay holds the outer key.
    let exit = circuit.exit_hop().node_id;
    let middle = circuit.middle_hop().node_id;
    for id in [middle, exit] {
        assert!(matches!(
            relays[&id].peel(&onion),
            Err(OnionError::Decryption(_))
        ));
    }
}

#[test]
fn layers_have_fixed_overhead() {
    let (_relays, directory) = relay_network(3);
    let circuit = CircuitBuilder::with_rng(StdRng::seed_from_u64(3))
        .build(&directory.list())
        .expect("circuit");
    let encoder = OnionEncoder::new(PortLayout::default());

    let short = encoder.encode("a", 3000, &circuit).expect("encode");
    let long = encoder.encode("abcdefghij", 3000, &circuit).expect("encode");
    assert!(long.len() > short.len());
    assert!(short.len() > 3 * (ENCRYPTED_KEY_LEN + ADDRESS_WIDTH));
}

#[test]
fn encoding_is_randomized_with_fixed_keys() {
    let (relays, directory) = relay_network(3);
    let circuit = CircuitBuilder::with_rng(StdRng::seed_from_u64(9))
        .build(&directory.list())
        .expect("circuit");
    let keys = [
        SymmetricKey::from_bytes([1; 32]),
        SymmetricKey::from_bytes([2; 32]),
        SymmetricKey::from_bytes([3; 32]),
    ];
    let encoder = OnionEncoder::new(PortLayout::default());

    let a = encoder
        .encode_with_keys("m", 3000, &circuit, &keys)
        .expect("encode");
    let b = encoder
        .encode_with_keys("m", 3000, &circuit, &keys)
        .expect("encode");
    // Key wrapping and nonces are randomized per encoding.
    assert_ne!(a, b);

    let entry = circuit.entry_hop().node_id;
    assert_eq!(
        relays[&entry].peel(&a).expect("peel").destination_port,
        relays[&entry].peel(&b).expect("peel").destination_port
    );
}

#[test]
fn duplicate_ids_and_small_directories() {
    let directory = InMemoryDirectory::new();
    let relay = RelayKeys::generate(7);
    directory.register(relay.identity()).expect("first");
    assert!(matches!(
        directory.register(relay.identity()),
        Err(OnionError::DuplicateNode { node_id: 7 })
    ));

    directory
        .register(RelayKeys::generate(8).identity())
        .expect("second");
    let err = CircuitBuilder::new()
        .build(&directory.list())
        .expect_err("two relays");
    assert!(matches!(
        err,
        OnionError::InsufficientNodes { need: 3, have: 2 }
    ));
}

#[test]
fn exported_key_peels_like_relay() {
    let (relays, directory) = relay_network(3);
    let circuit = CircuitBuilder::new()
        .build(&directory.list())
        .expect("circuit");
    let onion = OnionEncoder::new(PortLayout::default())
        .encode("x", 3000, &circuit)
        .expect("encode");

    let entry = &relays[&circuit.entry_hop().node_id];
    let secret = X25519StaticSecret::from_base64(&entry.export_private_key()).expect("import");
    let restored = RelayKeys::from_secret(entry.node_id(), secret);
    assert_eq!(
        restored.peel(&onion).expect("peel"),
        entry.peel(&onion).expect("peel")
    );
}
