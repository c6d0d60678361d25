use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use crate::{binary_stream::BitString, error::Error, Result};

#[derive(Clone, Copy)]
enum NodeKind<S> {
    Leaf {
        symbol: S,
    },
    Inner {
        left: Option<usize>,
        right: Option<usize>,
    },
}

#[derive(Clone, Copy)]
struct Node<S> {
    frequency: usize,
    parent: Option<usize>,
    kind: NodeKind<S>,
}

/// Arena of Huffman nodes addressed by index.
///
/// Parents are non-owning indices, so a leaf can walk up to the root without
/// the tree ever holding a reference cycle. A left edge is the bit `1`, a
/// right edge the bit `0`.
pub struct HuffmanTree<S> {
    nodes: Vec<Node<S>>,
    root_index: usize,
    leaves: BTreeMap<S, usize>,
}

/// Where a single decoded bit led to
pub enum Step<S> {
    Inner(usize),
    Leaf(S),
}

impl<S: Copy + Ord> HuffmanTree<S> {
    /// Merges the two least frequent nodes until a single root remains.
    ///
    /// Ties are resolved by creation order: leaves in the order given, merged
    /// nodes after all leaves. The first node popped becomes the left child.
    pub fn new(symbols_and_frequencies: &[(S, usize)]) -> Result<HuffmanTree<S>> {
        Self::validate_frequencies(symbols_and_frequencies)?;
        let mut tree = HuffmanTree {
            nodes: Vec::with_capacity(symbols_and_frequencies.len() * 2),
            root_index: 0,
            leaves: BTreeMap::new(),
        };
        let mut heap = BinaryHeap::new();
        for &(symbol, frequency) in symbols_and_frequencies {
            let index = tree.push_leaf(symbol, frequency);
            heap.push(Reverse((frequency, index)));
        }
        if tree.nodes.len() == 1 {
            tree.root_index = tree.push_inner(Some(0), None, symbols_and_frequencies[0].1);
            return Ok(tree);
        }
        while let (Some(Reverse((_, left))), Some(Reverse((_, right)))) = (heap.pop(), heap.pop())
        {
            let frequency = tree.nodes[left].frequency + tree.nodes[right].frequency;
            let index = tree.push_inner(Some(left), Some(right), frequency);
            heap.push(Reverse((frequency, index)));
            if heap.len() == 1 {
                break;
            }
        }
        tree.root_index = tree.nodes.len() - 1;
        Ok(tree)
    }

    /// Rebuilds a decoding trie from `(symbol, code)` pairs without any
    /// frequency information. Nodes are created lazily along each code path.
    pub fn from_codes(codes: &[(S, BitString)]) -> Result<HuffmanTree<S>> {
        if codes.is_empty() {
            return Err(Error::InvalidFrequencyTable("code table is empty"));
        }
        let mut tree = HuffmanTree {
            nodes: Vec::new(),
            root_index: 0,
            leaves: BTreeMap::new(),
        };
        tree.root_index = tree.push_inner(None, None, 0);
        for (symbol, code) in codes {
            if code.is_empty() {
                return Err(Error::InvalidFrequencyTable("code word is empty"));
            }
            if tree.leaves.contains_key(symbol) {
                return Err(Error::InvalidFrequencyTable("symbol occurs twice"));
            }
            let mut current_index = tree.root_index;
            for bit in code.iter() {
                current_index = tree.child_or_insert(current_index, bit)?;
            }
            match tree.nodes[current_index].kind {
                NodeKind::Inner {
                    left: None,
                    right: None,
                } => {
                    tree.nodes[current_index].kind = NodeKind::Leaf { symbol: *symbol };
                    tree.leaves.insert(*symbol, current_index);
                }
                _ => {
                    return Err(Error::InvalidFrequencyTable(
                        "code word is a prefix of another code word",
                    ))
                }
            }
        }
        Ok(tree)
    }

    fn validate_frequencies(symbols_and_frequencies: &[(S, usize)]) -> Result<()> {
        if symbols_and_frequencies.is_empty() {
            return Err(Error::InvalidFrequencyTable("symbol set is empty"));
        }
        if symbols_and_frequencies.iter().any(|&(_, f)| f == 0) {
            return Err(Error::InvalidFrequencyTable("symbol with zero frequency"));
        }
        let distinct: BTreeMap<S, usize> = symbols_and_frequencies.iter().copied().collect();
        if distinct.len() != symbols_and_frequencies.len() {
            return Err(Error::InvalidFrequencyTable("symbol occurs twice"));
        }
        Ok(())
    }

    fn push_leaf(&mut self, symbol: S, frequency: usize) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            frequency,
            parent: None,
            kind: NodeKind::Leaf { symbol },
        });
        self.leaves.insert(symbol, index);
        index
    }

    fn push_inner(&mut self, left: Option<usize>, right: Option<usize>, frequency: usize) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            frequency,
            parent: None,
            kind: NodeKind::Inner { left, right },
        });
        for child in [left, right].into_iter().flatten() {
            self.nodes[child].parent = Some(index);
        }
        index
    }

    fn child_or_insert(&mut self, index: usize, bit: bool) -> Result<usize> {
        let (left, right) = match self.nodes[index].kind {
            NodeKind::Inner { left, right } => (left, right),
            NodeKind::Leaf { .. } => {
                return Err(Error::InvalidFrequencyTable(
                    "code word extends past another code word",
                ))
            }
        };
        if let Some(child) = if bit { left } else { right } {
            return Ok(child);
        }
        let child = self.nodes.len();
        self.nodes.push(Node {
            frequency: 0,
            parent: Some(index),
            kind: NodeKind::Inner {
                left: None,
                right: None,
            },
        });
        self.nodes[index].kind = if bit {
            NodeKind::Inner {
                left: Some(child),
                right,
            }
        } else {
            NodeKind::Inner {
                left,
                right: Some(child),
            }
        };
        Ok(child)
    }

    /// Code word of `symbol`, collected leaf to root and then reversed
    pub fn code(&self, symbol: &S) -> Option<BitString> {
        let mut current_index = *self.leaves.get(symbol)?;
        let mut code = BitString::new();
        while let Some(parent_index) = self.nodes[current_index].parent {
            let took_left = matches!(
                self.nodes[parent_index].kind,
                NodeKind::Inner { left: Some(left), .. } if left == current_index
            );
            code.push(took_left);
            current_index = parent_index;
        }
        code.reverse();
        Some(code)
    }

    /// Follows one bit from the inner node at `index`
    pub fn step(&self, index: usize, bit: bool) -> Result<Step<S>> {
        let next = match self.nodes[index].kind {
            NodeKind::Inner { left, right } => {
                if bit {
                    left
                } else {
                    right
                }
            }
            NodeKind::Leaf { .. } => None,
        };
        let next = next.ok_or_else(|| {
            Error::CorruptBitstream(format!(
                "bit '{}' leads to no node below node {}",
                u8::from(bit),
                index
            ))
        })?;
        Ok(match self.nodes[next].kind {
            NodeKind::Leaf { symbol } => Step::Leaf(symbol),
            NodeKind::Inner { .. } => Step::Inner(next),
        })
    }

    pub fn root_index(&self) -> usize {
        self.root_index
    }

    pub fn symbols(&self) -> impl Iterator<Item = &S> + '_ {
        self.leaves.keys()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn depth(&self) -> usize {
        self.leaves
            .keys()
            .filter_map(|symbol| self.code(symbol))
            .map(|code| code.len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::{HuffmanTree, Step};
    use crate::binary_stream::BitString;
    use crate::error::Error;

    fn code_of(tree: &HuffmanTree<i32>, symbol: i32) -> String {
        tree.code(&symbol)
            .expect("symbol must be in tree")
            .to_string()
    }

    #[test]
    fn two_leaves_least_frequent_on_the_left() {
        let tree = HuffmanTree::new(&[(0, 3), (1, 1)]).unwrap();
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(code_of(&tree, 1), "1", "least frequent symbol goes left");
        assert_eq!(code_of(&tree, 0), "0");
    }

    #[test]
    fn ties_are_resolved_by_creation_order() {
        let tree = HuffmanTree::new(&[(1, 1), (2, 2), (3, 3), (4, 4)]).unwrap();
        assert_eq!(code_of(&tree, 4), "1");
        assert_eq!(code_of(&tree, 3), "01");
        assert_eq!(code_of(&tree, 1), "001");
        assert_eq!(code_of(&tree, 2), "000");
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn single_symbol_tree_has_one_bit_code() {
        let tree = HuffmanTree::new(&[(7, 5)]).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(code_of(&tree, 7), "1");
        assert!(matches!(
            tree.step(tree.root_index(), true),
            Ok(Step::Leaf(7))
        ));
        assert!(matches!(
            tree.step(tree.root_index(), false),
            Err(Error::CorruptBitstream(_))
        ));
    }

    #[test]
    fn reject_empty_symbol_set() {
        assert!(matches!(
            HuffmanTree::<i32>::new(&[]),
            Err(Error::InvalidFrequencyTable(_))
        ));
    }

    #[test]
    fn reject_duplicate_symbols() {
        assert!(matches!(
            HuffmanTree::new(&[(1, 2), (1, 3)]),
            Err(Error::InvalidFrequencyTable(_))
        ));
    }

    #[test]
    fn rebuild_from_codes() {
        let codes: Vec<(i32, BitString)> = [(4, "1"), (3, "01"), (1, "001"), (2, "000")]
            .into_iter()
            .map(|(s, c)| (s, c.parse().unwrap()))
            .collect();
        let tree = HuffmanTree::from_codes(&codes).unwrap();
        for (symbol, code) in &codes {
            assert_eq!(
                tree.code(symbol).as_ref(),
                Some(code),
                "Code of symbol {} does not match",
                symbol
            );
        }
    }

    #[test]
    fn reject_prefix_conflicts() {
        for table in [[(1, "1"), (2, "10")], [(1, "10"), (2, "1")]] {
            let codes: Vec<(i32, BitString)> = table
                .into_iter()
                .map(|(s, c)| (s, c.parse().unwrap()))
                .collect();
            assert!(matches!(
                HuffmanTree::from_codes(&codes),
                Err(Error::InvalidFrequencyTable(_))
            ));
        }
    }
}
