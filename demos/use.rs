use threaded_avl::ThreadedAvlMap;

fn main() {
    let mut map = ThreadedAvlMap::new();
    map.insert(0, "zero");
    map.insert(1, "one");
    map.insert(2, "two");
    map.insert(2, "deux");
    map.insert(3, "three");
    map.insert(4, "four");
    map.insert(5, "five");
    assert_eq!(map.get(&2), Some(&"two"));
    assert_eq!(map.successor(&2), Some(&3));
    assert_eq!(map.height_of(&42), -1);

    for (k, v) in &map {
        println!("{k} => {v}");
    }

    println!("keys in 1..=3: {:?}", map.range_search(&1, &3));

    map.begin();
    print!("{{ ");
    while let Some(key) = map.next_key() {
        print!("{key}, ");
    }
    println!("}}");
}
