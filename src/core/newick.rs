use crate::bio::sequence::Sequence;
use crate::core::guide_tree::GuideTree;
use crate::{DendrosortError, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{map, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::fs;
use std::path::Path;

/// Parsed Newick tree node. Only leaf names and child order matter to the
/// sorter; internal labels and branch lengths are retained for round-trips.
#[derive(Debug, Clone, PartialEq)]
pub struct NewickNode {
    pub name: Option<String>,
    pub length: Option<f64>,
    pub children: Vec<NewickNode>,
}

impl NewickNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Leaf names in depth-first order, children visited as written.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                if let Some(name) = &node.name {
                    names.push(name.as_str());
                }
            } else {
                for child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        names
    }
}

fn label(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !"(),:;".contains(c) && !c.is_whitespace())(input)
}

fn branch_length(input: &str) -> IResult<&str, f64> {
    preceded(preceded(multispace0, char(':')), preceded(multispace0, double))(input)
}

fn leaf(input: &str) -> IResult<&str, NewickNode> {
    map(pair(label, opt(branch_length)), |(name, length)| NewickNode {
        name: Some(name.to_string()),
        length,
        children: Vec::new(),
    })(input)
}

fn internal(input: &str) -> IResult<&str, NewickNode> {
    let (input, children) = delimited(
        preceded(multispace0, char('(')),
        separated_list1(preceded(multispace0, char(',')), node),
        preceded(multispace0, char(')')),
    )(input)?;
    let (input, name) = opt(preceded(multispace0, label))(input)?;
    let (input, length) = opt(branch_length)(input)?;

    Ok((
        input,
        NewickNode {
            name: name.map(str::to_string),
            length,
            children,
        },
    ))
}

fn node(input: &str) -> IResult<&str, NewickNode> {
    preceded(multispace0, alt((internal, leaf)))(input)
}

/// Parse a single Newick tree, terminated by ';'.
pub fn parse_newick(input: &str) -> Result<NewickNode> {
    let (rest, tree) = pair(node, preceded(multispace0, char(';')))(input)
        .map(|(rest, (tree, _))| (rest, tree))
        .map_err(|e| DendrosortError::Parse(format!("invalid Newick tree: {:?}", e)))?;

    if !rest.trim().is_empty() {
        return Err(DendrosortError::Parse(format!(
            "trailing content after Newick tree: '{}'",
            rest.trim()
        )));
    }

    Ok(tree)
}

pub fn read_newick<P: AsRef<Path>>(path: P) -> Result<NewickNode> {
    let text = fs::read_to_string(path)?;
    parse_newick(&text)
}

/// Newick characters are structural; anything that would break the grammar
/// gets replaced in emitted leaf names.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if "(),:;'\"".contains(c) || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn format_node(tree: &GuideTree, id: usize, sequences: &[Sequence], out: &mut String) {
    let node = tree.node(id);
    match node.leaf {
        Some(index) => out.push_str(&sanitize_name(&sequences[index].id)),
        None => {
            out.push('(');
            for (i, &child) in node.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                format_node(tree, child, sequences, out);
                let branch = (node.height - tree.node(child).height).max(0.0);
                out.push_str(&format!(":{}", branch));
            }
            out.push(')');
        }
    }
}

/// Serialize a built guide tree with ultrametric branch lengths.
pub fn write_newick(tree: &GuideTree, sequences: &[Sequence]) -> String {
    let mut out = String::new();
    format_node(tree, tree.root().id, sequences, &mut out);
    out.push(';');
    out.push('\n');
    out
}

pub fn write_newick_file<P: AsRef<Path>>(
    path: P,
    tree: &GuideTree,
    sequences: &[Sequence],
) -> Result<()> {
    fs::write(path, write_newick(tree, sequences))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::DistanceMatrix;
    use crate::core::guide_tree::GuideTreeBuilder;
    use crate::core::linkage::Linkage;

    #[test]
    fn test_parse_leaf_names_in_order() {
        let tree = parse_newick("((a:0.1,b:0.2):0.05,(c,d)label:0.3);").unwrap();
        assert_eq!(tree.leaf_names(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let tree = parse_newick("( a , ( b , c ) ) ;").unwrap();
        assert_eq!(tree.leaf_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_newick("(a,b)").is_err());
        assert!(parse_newick("(a,b); extra").is_err());
        assert!(parse_newick(";").is_err());
    }

    #[test]
    fn test_internal_label_not_a_leaf() {
        let tree = parse_newick("(a,b)root;").unwrap();
        assert_eq!(tree.name.as_deref(), Some("root"));
        assert_eq!(tree.leaf_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_write_then_parse_preserves_leaf_order() {
        let sequences = vec![
            Sequence::new("alpha".to_string(), b"ACGT".to_vec()),
            Sequence::new("beta".to_string(), b"AGGT".to_vec()),
            Sequence::new("gamma".to_string(), b"TTTT".to_vec()),
        ];
        let mut matrix = DistanceMatrix::zeroed(3);
        matrix.set(0, 1, 0.2);
        matrix.set(0, 2, 0.9);
        matrix.set(1, 2, 0.8);

        let tree = GuideTreeBuilder::new(Linkage::Average).build(&matrix).unwrap();
        let text = write_newick(&tree, &sequences);
        let parsed = parse_newick(&text).unwrap();

        assert_eq!(parsed.leaf_names(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("id with space"), "id_with_space");
        assert_eq!(sanitize_name("a(b):c"), "a_b__c");
        assert_eq!(sanitize_name("plain|id.1"), "plain|id.1");
    }
}
