use avl_tree::AvlTree;
use tracing_subscriber::EnvFilter;

fn report(title: &str, tree: &AvlTree<i32>) {
    println!("==== {title}");

    let keys: Vec<String> = tree.iter().map(i32::to_string).collect();
    println!("In-order: {}", keys.join(" "));

    println!("Balance factors:");
    for (key, bf) in tree.balance_factors() {
        println!("  {key}: {bf}");
    }

    println!("Height: {}\n", tree.height());
    tree.assert_invariants();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let tree: AvlTree<i32> = [30, 20, 10].into_iter().collect();
    report("Single rotation (insert)", &tree);

    let tree: AvlTree<i32> = [30, 10, 20].into_iter().collect();
    report("Double rotation (insert)", &tree);

    let mut tree: AvlTree<i32> = [10, 20, 30].into_iter().collect();
    tree.remove(&10);
    report("Single rotation (remove)", &tree);

    let mut tree: AvlTree<i32> = [20, 10, 30, 25, 40, 22].into_iter().collect();
    tree.remove(&40);
    report("Double rotation (remove)", &tree);
}
