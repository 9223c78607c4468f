//! Library of parser functions for ascii field files

// external crates
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1};
use nom::combinator::{map, map_res};
use nom::multi::{fold_many0, many1};
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;

/// Field classes understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoamClass {
    Scalar,
    Vector,
    Tensor,
    SymmTensor,
}

impl FoamClass {
    /// Map the `class` keyword of a field header
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "volScalarField" => Some(Self::Scalar),
            "volVectorField" => Some(Self::Vector),
            "volTensorField" => Some(Self::Tensor),
            "volSymmTensorField" => Some(Self::SymmTensor),
            _ => None,
        }
    }

    /// Number of values written per cell
    pub fn width(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector => 3,
            Self::Tensor => 9,
            Self::SymmTensor => 6,
        }
    }

    /// Trailing shape of the raw array, before any symmetric expansion
    pub fn tail(&self) -> &'static [usize] {
        match self {
            Self::Scalar => &[],
            Self::Vector => &[3],
            Self::Tensor => &[3, 3],
            Self::SymmTensor => &[6],
        }
    }
}

/// Values of the `internalField` entry
#[derive(Debug, Clone, PartialEq)]
pub enum InternalField {
    /// A single value (or row of values) shared by every cell
    Uniform(Vec<f64>),
    /// An explicit list with its declared length and flattened values
    NonUniform { length: usize, values: Vec<f64> },
}

// ! Header entries

/// Parse a `keyword value;` dictionary entry, returning the value
///
/// e.g. `class       volScalarField;` => `volScalarField`
pub fn keyword_entry<'a>(keyword: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |i| {
        delimited(
            tuple((multispace0, tag(keyword), multispace1)),
            alphanumeric1,
            tuple((multispace0, char(';'))),
        )(i)
    }
}

/// Find the first line of a file holding a `keyword value;` entry
pub fn find_keyword<'a>(text: &'a str, keyword: &'a str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| keyword_entry(keyword)(line).ok())
        .map(|(_, value)| value)
}

/// Parse the number of cells from a mesh `note` entry
///
/// e.g. `note "nPoints:1000 nCells:729 nFaces:2430 nInternalFaces:1944";`
pub fn n_cells_note(i: &str) -> IResult<&str, usize> {
    preceded(
        tuple((take_until("nCells:"), tag("nCells:"))),
        map_res(digit1, str::parse::<usize>),
    )(i)
}

// ! Field values

/// A single value or a bracketed row of values, e.g. `1.5` or `(1 0 0)`
pub fn value_row(i: &str) -> IResult<&str, Vec<f64>> {
    alt((
        map(double, |v| vec![v]),
        delimited(
            char('('),
            many1(preceded(multispace0, double)),
            preceded(multispace0, char(')')),
        ),
    ))(i)
}

/// `uniform <row>;`
fn uniform(i: &str) -> IResult<&str, InternalField> {
    map(
        delimited(
            tuple((tag("uniform"), multispace1)),
            value_row,
            tuple((multispace0, char(';'))),
        ),
        InternalField::Uniform,
    )(i)
}

/// `nonuniform List<type> <n> ( <row> <row> ... );`
///
/// Rows are folded straight into one flat buffer so large meshes never hold
/// a `Vec` per cell.
fn nonuniform(i: &str) -> IResult<&str, InternalField> {
    let (i, _) = tuple((
        tag("nonuniform"),
        multispace1,
        tag("List<"),
        alpha1,
        char('>'),
        multispace0,
    ))(i)?;
    let (i, length) = map_res(digit1, str::parse::<usize>)(i)?;
    let (i, _) = tuple((multispace0, char('(')))(i)?;
    let (i, values) = fold_many0(
        preceded(multispace0, value_row),
        Vec::new,
        |mut acc: Vec<f64>, row| {
            acc.extend(row);
            acc
        },
    )(i)?;
    let (i, _) = tuple((multispace0, char(')'), multispace0, char(';')))(i)?;
    Ok((i, InternalField::NonUniform { length, values }))
}

/// Parse the `internalField` entry from anywhere in the file
pub fn internal_field(i: &str) -> IResult<&str, InternalField> {
    preceded(
        tuple((take_until("internalField"), tag("internalField"), multispace1)),
        alt((uniform, nonuniform)),
    )(i)
}

/// True if the header declares a binary field file
pub fn is_binary(text: &str) -> bool {
    find_keyword(text, "format").is_some_and(|f| f == "binary")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALAR: &str = r#"
FoamFile
{
    version     2.0;
    format      ascii;
    class       volScalarField;
    location    "1000";
    object      k;
}
// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //

dimensions      [0 2 -2 0 0 0 0];

internalField   nonuniform List<scalar>
3
(
0.1
0.2
3e-05
)
;

boundaryField
{
    inlet
    {
        type            fixedValue;
        value           uniform 0.1;
    }
}
"#;

    #[test]
    fn header_keywords() {
        assert_eq!(find_keyword(SCALAR, "class"), Some("volScalarField"));
        assert_eq!(find_keyword(SCALAR, "format"), Some("ascii"));
        assert_eq!(find_keyword(SCALAR, "missing"), None);
        assert!(!is_binary(SCALAR));
    }

    #[test]
    fn nonuniform_scalar_list() {
        let (_, field) = internal_field(SCALAR).unwrap();
        assert_eq!(
            field,
            InternalField::NonUniform {
                length: 3,
                values: vec![0.1, 0.2, 3e-05]
            }
        );
    }

    #[test]
    fn nonuniform_vector_list() {
        let text = "internalField nonuniform List<vector> 2((1 2 3) (-4 5.5 6e2));";
        let (_, field) = internal_field(text).unwrap();
        assert_eq!(
            field,
            InternalField::NonUniform {
                length: 2,
                values: vec![1.0, 2.0, 3.0, -4.0, 5.5, 600.0]
            }
        );
    }

    #[test]
    fn uniform_values() {
        let (_, field) = internal_field("internalField   uniform 0;").unwrap();
        assert_eq!(field, InternalField::Uniform(vec![0.0]));

        let (_, field) = internal_field("internalField uniform (1 0 0);").unwrap();
        assert_eq!(field, InternalField::Uniform(vec![1.0, 0.0, 0.0]));
    }

    #[test]
    fn mesh_note() {
        let line = r#"    note        "nPoints:1000 nCells:729 nFaces:2430 nInternalFaces:1944";"#;
        assert_eq!(n_cells_note(line).unwrap().1, 729);
        assert!(n_cells_note("    class       labelList;").is_err());
    }

    #[test]
    fn class_keywords() {
        assert_eq!(FoamClass::from_keyword("volSymmTensorField"), Some(FoamClass::SymmTensor));
        assert_eq!(FoamClass::from_keyword("surfaceScalarField"), None);
        assert_eq!(FoamClass::SymmTensor.width(), 6);
        assert_eq!(FoamClass::Tensor.tail(), &[3, 3]);
    }

    #[test]
    fn truncated_list_fails() {
        assert!(internal_field("internalField nonuniform List<scalar> 2 (1.0 2.0").is_err());
    }
}
