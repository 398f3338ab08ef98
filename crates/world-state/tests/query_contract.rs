//! Three-way answers of the query interface and atomic block application.

use std::sync::Arc;
use std::thread;

use shared_types::{Block, Command, Proposal, Transaction, ZERO_HASH};
use world_state::{
    CommandError, InMemoryWorldState, WsvCommand, WsvError, WsvQuery,
};

const ADMIN: &str = "admin@test";

fn block(height: u64, prev_hash: [u8; 32], transactions: Vec<Transaction>) -> Block {
    Block::from_proposal(Proposal::new(height, transactions), prev_hash, 1_000 * height)
}

fn genesis() -> Block {
    let tx = Transaction::new(ADMIN, 1)
        .with_command(Command::AddPeer {
            address: "0.0.0.0:10001".into(),
            peer_key: [7u8; 32],
        })
        .with_command(Command::CreateRole {
            role_name: "user".into(),
            permissions: vec!["can_transfer".into()],
        })
        .with_command(Command::CreateDomain {
            domain_id: "test".into(),
            default_role: "user".into(),
        })
        .with_command(Command::CreateAccount {
            account_name: "admin".into(),
            domain_id: "test".into(),
            public_key: [1u8; 32],
        })
        .with_command(Command::CreateAsset {
            asset_name: "coin".into(),
            domain_id: "test".into(),
            precision: 2,
        })
        .with_command(Command::AddAssetQuantity {
            account_id: ADMIN.into(),
            asset_id: "coin#test".into(),
            amount: 500,
        });
    block(1, ZERO_HASH, vec![tx])
}

fn seeded() -> InMemoryWorldState {
    let wsv = InMemoryWorldState::new();
    wsv.apply_block(&genesis()).expect("genesis");
    wsv
}

#[test]
fn test_nonexistent_account_is_none() {
    let wsv = seeded();
    assert_eq!(wsv.get_account("nonexistent@domain").unwrap(), None);
}

#[test]
fn test_found_entities_are_fully_populated() {
    let wsv = seeded();

    let account = wsv.get_account(ADMIN).unwrap().expect("admin exists");
    assert_eq!(account.account_id, ADMIN);
    assert_eq!(account.domain_id, "test");

    let asset = wsv.get_asset("coin#test").unwrap().expect("coin exists");
    assert_eq!(asset.precision, 2);
    assert_eq!(asset.domain_id, "test");

    let domain = wsv.get_domain("test").unwrap().expect("domain exists");
    assert_eq!(domain.default_role, "user");

    let peers = wsv.get_peers().unwrap().expect("peer list");
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].address, "0.0.0.0:10001");

    assert_eq!(
        wsv.get_role_permissions("user").unwrap(),
        Some(vec!["can_transfer".to_string()])
    );
}

#[test]
fn test_failed_block_leaves_state_untouched() {
    let wsv = seeded();
    let top = wsv.top_hash();

    // First transaction is valid, second overdraws: nothing may stick.
    let ok = Transaction::new(ADMIN, 2).with_command(Command::CreateAccount {
        account_name: "bob".into(),
        domain_id: "test".into(),
        public_key: [2u8; 32],
    });
    let overdraw = Transaction::new(ADMIN, 3).with_command(Command::TransferAsset {
        src_account_id: ADMIN.into(),
        dest_account_id: "bob@test".into(),
        asset_id: "coin#test".into(),
        amount: 501,
    });

    let err = wsv
        .apply_block(&block(2, top, vec![ok, overdraw]))
        .unwrap_err();
    match err {
        WsvError::CommandFailed {
            tx_counter, source, ..
        } => {
            assert_eq!(tx_counter, 3);
            assert!(matches!(source, CommandError::InsufficientBalance { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(wsv.height(), 1);
    assert_eq!(wsv.top_hash(), top);
    assert_eq!(wsv.get_account("bob@test").unwrap(), None);
    assert_eq!(
        wsv.get_account_asset(ADMIN, "coin#test")
            .unwrap()
            .map(|h| h.balance),
        Some(500)
    );
}

#[test]
fn test_unavailable_store_is_an_error_not_a_miss() {
    let wsv = seeded();
    wsv.set_unavailable(true);

    assert!(matches!(
        wsv.get_account(ADMIN),
        Err(WsvError::Unavailable(_))
    ));
    assert!(matches!(
        wsv.has_account_grantable_permission("bob@test", ADMIN, "can_transfer"),
        Err(WsvError::Unavailable(_))
    ));
}

#[test]
fn test_concurrent_readers_see_whole_blocks() {
    let wsv = Arc::new(seeded());

    let reader = {
        let wsv = Arc::clone(&wsv);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let snapshot = wsv.snapshot().expect("available");
                let total: u128 = ["admin@test", "bob@test"]
                    .iter()
                    .filter_map(|id| snapshot.get_account_asset(id, "coin#test").unwrap())
                    .map(|h| h.balance)
                    .sum();
                assert_eq!(total, 500, "a transfer was observed half-applied");
            }
        })
    };

    let mut prev = wsv.top_hash();
    let create_bob = Transaction::new(ADMIN, 2).with_command(Command::CreateAccount {
        account_name: "bob".into(),
        domain_id: "test".into(),
        public_key: [2u8; 32],
    });
    let next = block(2, prev, vec![create_bob]);
    wsv.apply_block(&next).unwrap();
    prev = next.hash();

    for height in 3..=50u64 {
        let tx = Transaction::new(ADMIN, height).with_command(Command::TransferAsset {
            src_account_id: ADMIN.into(),
            dest_account_id: "bob@test".into(),
            asset_id: "coin#test".into(),
            amount: 1,
        });
        let next = block(height, prev, vec![tx]);
        wsv.apply_block(&next).unwrap();
        prev = next.hash();
    }

    reader.join().expect("reader");
    assert_eq!(wsv.height(), 50);
}
