//! Dataset loading: column-selected CSV files and gzip IDX (MNIST) images.
use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

/// A parsed CSV cell: numeric when parsing or a converter succeeded,
/// otherwise the original text.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }
}

/// Maps a raw cell to a number; `None` keeps the cell as text.
pub type Converter = Box<dyn Fn(&str) -> Option<f64>>;

/// How many leading rows become the test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitTest {
    Half,
    Count(usize),
}

/// Column selection and post-processing for [`load_csv`].
#[derive(Default)]
pub struct CsvOptions {
    pub data_columns: Vec<String>,
    pub label_columns: Vec<String>,
    /// Keyed by header name.
    pub converters: HashMap<String, Converter>,
    /// Seed for a single permutation applied to features and labels alike.
    pub shuffle: Option<u64>,
    pub split_test: Option<SplitTest>,
}

impl CsvOptions {
    pub fn new<S: Into<String>>(
        data_columns: impl IntoIterator<Item = S>,
        label_columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            data_columns: data_columns.into_iter().map(Into::into).collect(),
            label_columns: label_columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_converter(
        mut self,
        column: impl Into<String>,
        converter: impl Fn(&str) -> Option<f64> + 'static,
    ) -> Self {
        self.converters.insert(column.into(), Box::new(converter));
        self
    }

    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle = Some(seed);
        self
    }

    pub fn split(mut self, split: SplitTest) -> Self {
        self.split_test = Some(split);
        self
    }
}

/// Rows selected from a CSV file. The test fields are set only when
/// [`CsvOptions::split_test`] was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub features: Vec<Vec<Cell>>,
    pub labels: Vec<Vec<Cell>>,
    pub test_features: Option<Vec<Vec<Cell>>>,
    pub test_labels: Option<Vec<Vec<Cell>>>,
}

/// Load a headed, comma-separated file.
pub fn load_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<CsvData> {
    let file = File::open(path)?;
    load_csv_from_reader(file, options)
}

pub fn load_csv_from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<CsvData> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column_index = |name: &String| {
        headers
            .iter()
            .position(|h| h == name.as_str())
            .ok_or_else(|| Error::UnknownColumn(name.clone()))
    };
    let data_idx = options
        .data_columns
        .iter()
        .map(column_index)
        .collect::<Result<Vec<_>>>()?;
    let label_idx = options
        .label_columns
        .iter()
        .map(column_index)
        .collect::<Result<Vec<_>>>()?;

    let parse = |record: &csv::StringRecord, idx: usize| -> Cell {
        let raw = record.get(idx).unwrap_or("");
        match options.converters.get(&headers[idx]) {
            Some(convert) => convert(raw).map_or_else(|| Cell::Text(raw.to_string()), Cell::Number),
            None => raw
                .trim_matches('"')
                .parse::<f64>()
                .map_or_else(|_| Cell::Text(raw.to_string()), Cell::Number),
        }
    };

    let mut features = Vec::new();
    let mut labels = Vec::new();
    for result in rdr.records() {
        let record = result?;
        features.push(data_idx.iter().map(|&i| parse(&record, i)).collect::<Vec<_>>());
        labels.push(label_idx.iter().map(|&i| parse(&record, i)).collect::<Vec<_>>());
    }

    if let Some(seed) = options.shuffle {
        let mut order: Vec<usize> = (0..features.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        features = permute(features, &order);
        labels = permute(labels, &order);
    }

    match options.split_test {
        None => Ok(CsvData {
            features,
            labels,
            test_features: None,
            test_labels: None,
        }),
        Some(split) => {
            let test_size = match split {
                SplitTest::Half => features.len() / 2,
                SplitTest::Count(n) => n.min(features.len()),
            };
            let train_features = features.split_off(test_size);
            let train_labels = labels.split_off(test_size);
            Ok(CsvData {
                features: train_features,
                labels: train_labels,
                test_features: Some(features),
                test_labels: Some(labels),
            })
        }
    }
}

fn permute<T>(rows: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}

/// Convert cells to numbers, failing on the first text cell.
pub fn numeric_rows(cells: &[Vec<Cell>]) -> Result<Vec<Vec<f64>>> {
    cells
        .iter()
        .enumerate()
        .map(|(row, values)| {
            values
                .iter()
                .enumerate()
                .map(|(column, cell)| match cell {
                    Cell::Number(v) => Ok(*v),
                    Cell::Text(value) => Err(Error::NonNumeric {
                        row,
                        column,
                        value: value.clone(),
                    }),
                })
                .collect()
        })
        .collect()
}

/// One-hot encode
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; num_classes];
    if label < num_classes {
        v[label] = 1.0;
    }
    v
}

const IDX_LABELS_MAGIC: u32 = 2049;
const IDX_IMAGES_MAGIC: u32 = 2051;
const MNIST_CLASSES: usize = 10;

/// Decompressed IDX file: dimension sizes and raw bytes.
#[derive(Debug)]
struct IdxData {
    sizes: Vec<usize>,
    data: Vec<u8>,
}

impl IdxData {
    fn read(path: &Path, expected_magic: u32) -> Result<Self> {
        let bad = |reason: String| Error::Idx {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path)?;
        let mut gz = GzDecoder::new(file);
        let mut contents = Vec::new();
        gz.read_to_end(&mut contents)?;
        let mut r = Cursor::new(&contents);
        let magic = r
            .read_u32::<BigEndian>()
            .map_err(|e| bad(format!("read magic: {e}")))?;
        if magic != expected_magic {
            return Err(bad(format!("magic {magic}, expected {expected_magic}")));
        }
        let dims = if magic == IDX_IMAGES_MAGIC { 3 } else { 1 };
        let mut sizes = Vec::with_capacity(dims);
        for _ in 0..dims {
            let size = r
                .read_u32::<BigEndian>()
                .map_err(|e| bad(format!("read dimension: {e}")))?;
            sizes.push(size as usize);
        }
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        let expected = sizes
            .iter()
            .try_fold(1usize, |acc, &size| acc.checked_mul(size))
            .ok_or_else(|| bad(format!("dimensions {sizes:?} overflow")))?;
        if data.len() < expected {
            return Err(bad(format!(
                "{} bytes of payload, expected {expected}",
                data.len()
            )));
        }
        Ok(Self { sizes, data })
    }
}

/// Load gzip IDX images and labels as flattened pixels scaled to `[0, 1]`
/// and one-hot label rows. `limit` keeps only the first rows.
pub fn load_mnist(
    images: impl AsRef<Path>,
    labels: impl AsRef<Path>,
    limit: Option<usize>,
) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    let image_data = IdxData::read(images.as_ref(), IDX_IMAGES_MAGIC)?;
    let label_data = IdxData::read(labels.as_ref(), IDX_LABELS_MAGIC)?;
    let count = image_data.sizes[0].min(label_data.sizes[0]);
    let count = limit.map_or(count, |l| l.min(count));
    let image_size = image_data.sizes[1] * image_data.sizes[2];

    let features = image_data
        .data
        .chunks_exact(image_size.max(1))
        .take(count)
        .map(|pixels| pixels.iter().map(|&b| b as f64 / 255.0).collect())
        .collect::<Vec<Vec<f64>>>();
    let labels = label_data.data[..count]
        .iter()
        .map(|&label| one_hot(label as usize, MNIST_CLASSES))
        .collect::<Vec<_>>();
    if features.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok((features, labels))
}
