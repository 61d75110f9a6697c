use std::io;

use threaded_avl::ThreadedAvlMap;

fn main() -> io::Result<()> {
    let mut map = ThreadedAvlMap::new();
    for key in [55, 48, 64, 38, 51, 60, 78, 16, 40, 45] {
        map.insert(key, -key);
    }

    let stdout = io::stdout();
    map.dump(&mut stdout.lock())
}
