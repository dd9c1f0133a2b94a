use pretty_assertions::assert_eq;
use stackprobe::aggregator::{aggregate_groups, GroupSpec};
use stackprobe::sampler::{Frame, Sample};
use stackprobe::tree::{build_call_tree, collapse, prune_top, sort, sort_by, CallTree, Node};
use stackprobe::Glob;
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Sample from a space-separated stack, innermost frame first
fn sample(stack: &'static str, duration: u64) -> Sample {
    Sample::new(
        stack.split_whitespace().map(Frame::new).collect(),
        ms(duration),
        Duration::ZERO,
    )
}

fn check_totals(node: &Node) {
    let children: Duration = node.children().iter().map(Node::total_time).sum();
    assert_eq!(node.total_time(), node.own_time() + children);
    assert!(node.total_time() >= node.own_time());
    node.children().iter().for_each(check_totals);
}

/// A tree with shared prefixes, repeated symbols and uneven weights
fn busy_tree() -> CallTree {
    let samples = vec![
        sample("lib.json.Encode app.Handler fw.Dispatch app.Main thread.Run", 20),
        sample("fw.Reflect fw.Dispatch app.Main thread.Run", 20),
        sample("app.Handler fw.Dispatch app.Main thread.Run", 40),
        sample("lib.db.Query app.Main thread.Run", 60),
        sample("app.Main thread.Run", 20),
        sample("lib.json.Encode app.Handler fw.Dispatch app.Main thread.Run", 20),
    ];
    build_call_tree(&samples, ms(180))
}

#[test]
fn test_three_samples_merge_into_weighted_tree() {
    let samples = vec![
        sample("A Main", 1),
        sample("B Main", 1),
        sample("A Main", 1),
    ];
    let tree = build_call_tree(&samples, ms(3));

    let main = tree.find(&["Main"]).unwrap();
    assert_eq!(main.occurrences(), 3);
    assert_eq!(main.total_time(), ms(3));

    let a = main.child("A").unwrap();
    assert_eq!(a.occurrences(), 2);
    assert_eq!(a.total_time(), ms(2));

    let b = main.child("B").unwrap();
    assert_eq!(b.occurrences(), 1);
    assert_eq!(b.total_time(), ms(1));
}

#[test]
fn test_total_time_invariant_holds_everywhere() {
    let tree = busy_tree();
    tree.roots().iter().for_each(check_totals);

    let roots_total: Duration = tree.roots().iter().map(Node::total_time).sum();
    assert_eq!(roots_total, tree.total_time());
}

#[test]
fn test_prune_and_sort_are_idempotent() {
    let tree = busy_tree();

    let pruned = prune_top(&tree);
    assert_eq!(prune_top(&pruned), pruned);

    let sorted = sort(&tree);
    assert_eq!(sort(&sorted), sorted);

    let by_name = |a: &Node, b: &Node| a.symbol().cmp(b.symbol());
    let named = sort_by(&tree, by_name);
    assert_eq!(sort_by(&named, by_name), named);
}

#[test]
fn test_hard_collapse_everything_yields_leaves() {
    let collapsed = collapse(&busy_tree(), &Glob::empty(), &Glob::new(["*"]).unwrap());
    for (_, node) in collapsed.walk() {
        assert!(node.children().is_empty());
    }
    assert_eq!(collapsed.roots()[0].own_time(), ms(180));
}

#[test]
fn test_soft_collapse_keeps_callbacks_into_app_code() {
    let soft = Glob::new(["fw.*", "lib.*"]).unwrap();
    let collapsed = collapse(&busy_tree(), &soft, &Glob::empty());

    let dispatch = collapsed
        .find(&["thread.Run", "app.Main", "fw.Dispatch"])
        .unwrap();
    assert!(!dispatch.is_leaf());
    assert!(dispatch.child("app.Handler").is_some());
    assert!(dispatch.child("fw.Reflect").unwrap().is_leaf());

    let query = collapsed
        .find(&["thread.Run", "app.Main", "lib.db.Query"])
        .unwrap();
    assert_eq!(query.own_time(), ms(60));
}

#[test]
fn test_group_shallow_match_suppresses_descent() {
    let inner = Node::leaf(Frame::new("pkg.io.Socket"), ms(50), 1);
    let socket = Node::new(Frame::new("pkg.io.Socket"), ms(50), 2, vec![inner]);
    let query = Node::new(Frame::new("pkg.db.Query"), ms(200), 3, vec![socket]);
    let tree = CallTree::new(vec![query], ms(300), 3);

    let spec = GroupSpec::new()
        .with_group("DB", Glob::new(["pkg.db.*"]).unwrap())
        .with_group("IO", Glob::new(["pkg.io.*"]).unwrap());
    let totals = aggregate_groups(&tree, &spec);

    assert_eq!(totals.get("DB"), Some(ms(300)));
    assert_eq!(totals.get("IO"), Some(Duration::ZERO));
}

#[test]
fn test_glob_matches_package_prefix() {
    let glob = Glob::new(["java.lang.*"]).unwrap();
    assert!(glob.matches("java.lang.String"));
    assert!(glob.matches("java.lang.reflect.Method"));
    assert!(!glob.matches("java.util.List"));
    assert!(!glob.matches("javax.net.SocketFactory"));

    let nothing = Glob::new(Vec::<String>::new()).unwrap();
    for symbol in ["", "java.lang.String", "*"] {
        assert!(!nothing.matches(symbol));
    }
}
