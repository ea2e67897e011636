use std::{collections::VecDeque, fmt};

use crate::{Color, NodeRef, RbTree};

impl<K> RbTree<K>
where
    K: fmt::Display,
{
    /// Writes the tree as a Graphviz digraph, one rank per tree level.
    ///
    /// Missing children are drawn as black points so the sentinel leaves are visible.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<'a, K> {
            Node(NodeRef<'a, K>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        writeln!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let key = node.key();
                let (fill, font) = match node.color() {
                    Color::Red => ("red", "white"),
                    Color::Black => ("black", "white"),
                };
                write!(
                    w,
                    "\"graph{name}-{key}\" [label=\"{key}\", style=filled, fillcolor={fill}, fontcolor={font}]; "
                )?;

                for child in [node.left(), node.right()] {
                    match child {
                        Some(child) => {
                            let child_key = child.key();
                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
