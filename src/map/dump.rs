use std::fmt::Display;
use std::io::{self, Write};

use super::{Node, Right, ThreadedAvlMap};

const BANNER: &str = "**************************************************";
const TITLE: &str = "********************* AVLT ***********************";

impl<K: Display, V: Display> ThreadedAvlMap<K, V> {
    /// Writes a line-oriented report of the tree to `output`.
    ///
    /// After a header with size and height, every node is written in key order
    /// as `(key,value,height)`, or as `(key,value,height,successor)` if its
    /// right slot is a thread to another node.
    ///
    /// ```
    /// use threaded_avl::ThreadedAvlMap;
    /// let map: ThreadedAvlMap<_, _> = [(2, 20), (1, 10)].into_iter().collect();
    /// let mut output = Vec::new();
    /// map.dump(&mut output).unwrap();
    /// let report = String::from_utf8(output).unwrap();
    /// assert!(report.contains("(1,10,0,2)\n(2,20,1)\n"));
    /// ```
    pub fn dump<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "{BANNER}")?;
        writeln!(output, "{TITLE}")?;
        writeln!(output, "** size: {}", self.len())?;
        writeln!(output, "** height: {}", self.height())?;

        let mut current = self.first_node();
        while let Some(node_ptr) = current {
            let node = unsafe { node_ptr.as_ref() };
            match node.right {
                Right::Thread(Some(next_ptr)) => {
                    let next_key = unsafe { &next_ptr.as_ref().key };
                    writeln!(
                        output,
                        "({},{},{},{})",
                        node.key, node.value, node.height, next_key
                    )?;
                }
                _ => writeln!(output, "({},{},{})", node.key, node.value, node.height)?,
            }
            current = unsafe { Node::successor(node_ptr) };
        }

        writeln!(output, "{BANNER}")
    }
}
