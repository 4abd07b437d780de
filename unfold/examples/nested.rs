//! Walk through nested categories with the single-expanded policy on,
//! then persist and restore the expansion state.
//!
//! Run with:
//! `RUST_LOG=debug cargo run --package unfold --example nested`

use std::error::Error;

use unfold::{
    Child, ExpansionEvent, FlatItem, FlatTree, JsonStateBag, ParentNode,
    SingleExpandedSibling, collapse_depth,
};

type Tree = FlatTree<String, String>;

/// Categories at depth 1, each with three sub-categories at depth 2 holding
/// five items.
fn categories(count: usize) -> Vec<ParentNode<String, String>> {
    (1..=count)
        .map(|category| {
            let subs = (1..=3).map(|sub| {
                let node = ParentNode::new(format!("Sub-Category {sub}"), 2)
                    .with_children(
                        (1..=5).map(|item| Child::Leaf(format!("Item {item}"))),
                    );
                Child::Parent(node)
            });
            ParentNode::new(format!("Category {category}"), 1)
                .with_children(subs)
        })
        .collect()
}

fn print_rows(title: &str, tree: &Tree) {
    println!("-- {title} ({} rows)", tree.item_count());
    let mut indent = 0;
    for item in tree.iter() {
        match item {
            FlatItem::Parent(parent) => {
                indent = parent.depth;
                let marker = if parent.expanded { "v" } else { ">" };
                println!(
                    "{}{marker} {}",
                    "  ".repeat(parent.depth.saturating_sub(1)),
                    parent.data
                );
            },
            FlatItem::Child(leaf) => {
                println!("{}- {leaf}", "  ".repeat(indent));
            },
        }
    }
}

fn toggle_row(tree: &mut Tree, position: usize) -> Result<(), Box<dyn Error>> {
    let id = match tree.item_at(position)? {
        FlatItem::Parent(parent) => parent.id,
        FlatItem::Child(leaf) => {
            return Err(format!("row {position} is the leaf {leaf:?}").into());
        },
    };
    let delta = tree.toggle(id, position);
    println!("toggle row {position}: {:?}", delta.changes());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut tree = Tree::new(categories(3));
    SingleExpandedSibling::new()
        .then(|_, event: &ExpansionEvent| {
            println!(
                "   {:?} {} at logical position {}",
                event.kind, event.parent, event.logical_position
            );
        })
        .install(&mut tree);

    tree.expand_first();
    toggle_row(&mut tree, 2)?;
    print_rows("first category and its second sub-category", &tree);

    // Expanding another category collapses the first one.
    toggle_row(&mut tree, 9)?;
    print_rows("single expanded category", &tree);

    let mut bag = JsonStateBag::new();
    tree.save_state(&mut bag);
    let json = bag.to_json_string()?;
    println!("saved state: {json}");

    let mut restored = Tree::new(categories(3));
    restored.restore_state(&JsonStateBag::from_json_str(&json)?);
    print_rows("restored", &restored);

    collapse_depth(&mut restored, 1);
    print_rows("categories collapsed", &restored);
    Ok(())
}
