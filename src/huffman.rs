pub mod tree;

use std::collections::BTreeMap;
use std::fmt::Debug;

use log::trace;

use crate::{binary_stream::BitString, error::Error, Result};
use tree::{HuffmanTree, Step};

/// Occurrence count per key, ordered by key
pub type FrequencyTable<S> = BTreeMap<S, usize>;

/// Groups `data` by `key` and counts the members of every group
pub fn frequency_table<T, S: Ord>(data: &[T], key: impl Fn(&T) -> S) -> FrequencyTable<S> {
    let mut table = FrequencyTable::new();
    for element in data {
        *table.entry(key(element)).or_insert(0) += 1;
    }
    table
}

/// One transmitted table row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableEntry<S> {
    pub symbol: S,
    pub code: BitString,
}

pub struct HuffmanCoder<S> {
    tree: HuffmanTree<S>,
    // sorted by symbol
    encoding_table: BTreeMap<S, BitString>,
}

impl<S: Copy + Ord + Debug> HuffmanCoder<S> {
    pub fn from_data(data: &[S]) -> Result<Self> {
        Self::from_frequencies(&frequency_table(data, |&s| s))
    }

    pub fn from_frequencies(frequencies: &FrequencyTable<S>) -> Result<Self> {
        let symbols_and_frequencies: Vec<(S, usize)> =
            frequencies.iter().map(|(&s, &f)| (s, f)).collect();
        let tree = HuffmanTree::new(&symbols_and_frequencies)?;
        trace!(
            "Built Huffman tree over {} symbols with depth {}",
            tree.leaf_count(),
            tree.depth()
        );
        Ok(Self::with_tree(tree))
    }

    /// Rebuilds a coder from a transmitted table; no frequencies are needed.
    pub fn from_table(table: &[TableEntry<S>]) -> Result<Self> {
        let codes: Vec<(S, BitString)> = table
            .iter()
            .map(|entry| (entry.symbol, entry.code.clone()))
            .collect();
        Ok(Self::with_tree(HuffmanTree::from_codes(&codes)?))
    }

    fn with_tree(tree: HuffmanTree<S>) -> Self {
        let encoding_table = tree
            .symbols()
            .filter_map(|&symbol| tree.code(&symbol).map(|code| (symbol, code)))
            .collect();
        Self {
            tree,
            encoding_table,
        }
    }

    pub fn encode(&self, data: &[S]) -> Result<BitString> {
        let mut output = BitString::new();
        for symbol in data {
            let code = self
                .encoding_table
                .get(symbol)
                .ok_or_else(|| Error::SymbolNotPresentInTree(format!("{:?}", symbol)))?;
            output.append(code);
        }
        Ok(output)
    }

    /// Descends from the root one bit at a time and restarts at every leaf.
    /// Bits left over after the last complete code word are ignored.
    pub fn decode(&self, bits: &BitString) -> Result<Vec<S>> {
        let mut output = Vec::new();
        let mut current_index = self.tree.root_index();
        for bit in bits.iter() {
            match self.tree.step(current_index, bit)? {
                Step::Inner(index) => current_index = index,
                Step::Leaf(symbol) => {
                    output.push(symbol);
                    current_index = self.tree.root_index();
                }
            }
        }
        Ok(output)
    }

    /// Every leaf with its code word, ordered by symbol
    pub fn table(&self) -> Vec<TableEntry<S>> {
        self.encoding_table
            .iter()
            .map(|(&symbol, code)| TableEntry {
                symbol,
                code: code.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{frequency_table, HuffmanCoder, TableEntry};
    use crate::binary_stream::BitString;
    use crate::error::Error;

    /// deterministic pseudo random symbols, skewed towards small values
    fn skewed_data(length: usize) -> Vec<i32> {
        let mut state: u32 = 0x2545_F491;
        (0..length)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let value = (state % 1000) as i32;
                value * value / 10_000 - 30
            })
            .collect()
    }

    fn round_trip(data: &[i32]) {
        let coder = HuffmanCoder::from_data(data).unwrap();
        let encoded = coder.encode(data).unwrap();
        let decoded = coder.decode(&encoded).unwrap();
        assert_eq!(decoded, data, "Round trip with the original tree failed");

        let rebuilt = HuffmanCoder::from_table(&coder.table()).unwrap();
        let decoded = rebuilt.decode(&encoded).unwrap();
        assert_eq!(decoded, data, "Round trip with the rebuilt tree failed");
    }

    #[test]
    fn frequency_table_with_key_function() {
        let data = [("A", 0), ("B", 1), ("B", 0)];
        let table = frequency_table(&data, |&(name, _)| name);
        assert_eq!(table.len(), 2);
        assert_eq!(table["A"], 1);
        assert_eq!(table["B"], 2);

        let table = frequency_table(&data, |&(_, value)| value);
        assert_eq!(table[&0], 2);
        assert_eq!(table[&1], 1);
    }

    #[test]
    fn single_symbol_encodes_one_bit_per_occurrence() {
        let data = [42; 5];
        let coder = HuffmanCoder::from_data(&data).unwrap();
        let encoded = coder.encode(&data).unwrap();
        assert_eq!(encoded.to_string(), "11111");
        assert_eq!(coder.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn encode_frequencies_one_to_four() {
        let data = [1, 2, 2, 3, 3, 3, 4, 4, 4, 4];
        let coder = HuffmanCoder::from_data(&data).unwrap();
        let encoded = coder.encode(&data).unwrap();
        let expected = format!(
            "{}{}{}{}",
            "001",
            "000".repeat(2),
            "01".repeat(3),
            "1".repeat(4)
        );
        assert_eq!(encoded.to_string(), expected);
        assert_eq!(encoded.len(), 19);
        round_trip(&data);
    }

    #[test]
    fn encode_other_data_with_same_tree() {
        let coder = HuffmanCoder::from_data(&[1, 2, 2, 3, 3, 3, 4, 4, 4, 4]).unwrap();
        let encoded = coder.encode(&[4, 4, 4, 4]).unwrap();
        assert_eq!(encoded.to_string(), "1111");
    }

    #[test]
    fn table_is_ordered_by_symbol() {
        let coder = HuffmanCoder::from_data(&[3, 1, 2, 2]).unwrap();
        let symbols: Vec<i32> = coder.table().iter().map(|entry| entry.symbol).collect();
        assert_eq!(symbols, vec![1, 2, 3]);
    }

    #[test]
    fn reconstruct_random_data() {
        round_trip(&skewed_data(10_000));
    }

    #[test]
    fn reconstruct_equal_frequencies() {
        let data: Vec<i32> = (0..64).chain(0..64).collect();
        round_trip(&data);
    }

    #[test]
    fn reconstruct_single_point() {
        round_trip(&[-7]);
    }

    #[test]
    fn reconstruct_singleton_alphabet() {
        round_trip(&[0; 33]);
    }

    #[test]
    fn trailing_partial_code_is_ignored() {
        let coder = HuffmanCoder::from_data(&[1, 2, 2, 3, 3, 3, 4, 4, 4, 4]).unwrap();
        let bits: BitString = "1010".parse().unwrap();
        assert_eq!(coder.decode(&bits).unwrap(), vec![4, 3]);
    }

    #[test]
    fn reject_unknown_symbol() {
        let coder = HuffmanCoder::from_data(&[1, 2, 3]).unwrap();
        assert!(matches!(
            coder.encode(&[1, 5]),
            Err(Error::SymbolNotPresentInTree(symbol)) if symbol == "5"
        ));
    }

    #[test]
    fn reject_bits_without_leaf() {
        let table = vec![
            TableEntry {
                symbol: 1,
                code: "1".parse().unwrap(),
            },
            TableEntry {
                symbol: 2,
                code: "01".parse().unwrap(),
            },
        ];
        let coder = HuffmanCoder::from_table(&table).unwrap();
        let bits: BitString = "1001".parse().unwrap();
        assert!(matches!(
            coder.decode(&bits),
            Err(Error::CorruptBitstream(_))
        ));
    }

    #[test]
    fn reject_empty_data() {
        assert!(matches!(
            HuffmanCoder::<i32>::from_data(&[]),
            Err(Error::InvalidFrequencyTable(_))
        ));
        assert!(matches!(
            HuffmanCoder::<i32>::from_table(&[]),
            Err(Error::InvalidFrequencyTable(_))
        ));
    }
}
