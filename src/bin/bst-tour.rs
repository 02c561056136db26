//! Walks through the map's operations on a small sample tree. Run with `RUST_LOG=debug` to see
//! the erase and balance log records.

use std::io;
use std::mem;

use bst_rewrite::{BstMap, Error};
use compare::{natural, Compare};
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut tree = BstMap::new();
    for k in [8, 3, 6, 1, 10, 7, 14, 4, 13] {
        tree.insert(k, k);
    }
    println!("Tree: {}", tree);

    let mut copy = tree.clone();
    copy.insert(12, 12);
    println!("Copied tree after inserting 12: {}", copy);
    println!("Source tree: {}", tree);

    let moved = mem::take(&mut tree);
    println!("Moved tree: {}", moved);
    println!("Source after move is empty: {}", tree.is_empty());

    let mut names: BstMap<String, String> = BstMap::new();
    names.emplace("Keerthana", "Chandrasekar");
    names.emplace("Azza", "Abdalghani");
    names.emplace("Giulia", "Milano");
    println!("Insert using emplace: {}", names);

    let mut greater = BstMap::with_comparator(natural().rev());
    greater.insert(7, 7);
    for k in [1, 15, 3, 16, 18, 19, 38, 90, 123] {
        greater.insert(k, k);
    }
    greater.insert(234, 678);
    println!("Unbalanced tree with reversed order: {}", greater);
    println!("Balanced? {} (height {})", greater.check_balance(), greater.height());
    greater.balance();
    println!("Balanced? {} (height {})", greater.check_balance(), greater.height());
    println!("Level order:");
    greater.dump(&mut io::stdout())?;

    let mut tree = moved;
    for (key, what) in [
        (4, "a leaf node"),
        (10, "a node lacking a left child"),
        (14, "a node lacking a right child"),
        (3, "a node having two children"),
        (8, "the root with two children"),
        (13, "the root lacking the right child"),
        (1, "a leaf node"),
        (6, "the root lacking the left child"),
        (18, "a key which is not in the tree"),
    ] {
        match tree.erase(&key) {
            Ok(_) => println!("Erased {} ({}): {}", key, what, tree),
            Err(Error::KeyNotFound) => println!("Could not erase {} ({}): {}", key, what, tree),
            Err(err) => return Err(err.into()),
        }
    }
    tree.check_invariants()?;

    let mut another = BstMap::with_comparator(|a: &f64, b: &f64| a.total_cmp(b));
    another.insert(9.1, 9.1);
    *another.get_or_default(1.5) = 1.5;
    *another.get_or_default(3.4) = 3.4;
    *another.get_or_default(54.9) = 54.9;
    println!("Another tree: {}", another);

    info!("tour finished");
    Ok(())
}
