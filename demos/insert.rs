use dartrie::DoubleArrayTrie;

fn main() {
    let mut trie: DoubleArrayTrie<i32> = DoubleArrayTrie::new();

    for (i, city) in ["tokyo", "kyoto", "osaka", "kyushu"].iter().enumerate() {
        trie.update(city.as_bytes(), i as i32);
    }

    println!("exact_match(\"kyoto\") = {:?}", trie.exact_match(b"kyoto"));
    println!("exact_match(\"nara\") = {:?}", trie.exact_match(b"nara"));

    let hits = trie.common_prefix_predict(b"ky");
    println!("keys starting with \"ky\":");
    for hit in &hits {
        let suffix = trie.suffix(hit.leaf, b"ky".len() + hit.length);
        println!("  {:?} -> {}", String::from_utf8_lossy(&suffix), hit.value);
    }

    trie.erase(b"kyoto").expect("kyoto was just inserted");
    println!(
        "after erasing \"kyoto\": exact_match = {:?}",
        trie.exact_match(b"kyoto")
    );
    println!("remaining keys: {}", trie.num_keys());

    let mut buf = Vec::new();
    trie.save(&mut buf).expect("save to an in-memory buffer cannot fail");
    let reloaded: DoubleArrayTrie<i32> =
        DoubleArrayTrie::load(buf.as_slice()).expect("buffer was just written by save");
    println!(
        "reloaded trie has {} keys, exact_match(\"osaka\") = {:?}",
        reloaded.num_keys(),
        reloaded.exact_match(b"osaka")
    );
}
