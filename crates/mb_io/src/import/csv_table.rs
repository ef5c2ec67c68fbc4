// crates/mb_io/src/import/csv_table.rs

//! CSV 表格解析
//!
//! 提供从 CSV 文件加载表格数据的功能，支持：
//! - 灵活的分隔符与表头配置
//! - 注释行/空行跳过
//! - 无效行跳过或报错两种策略
//! - 按名取列，缺少必需列是致命错误
//!
//! # 使用示例
//!
//! ```ignore
//! use mb_io::import::csv_table::{CsvOptions, NamedMatrix};
//!
//! let matrix = NamedMatrix::parse_str(content, &CsvOptions::default(), None)?;
//! let flux = matrix.column("Area1_to_Area2")?;
//! ```

use mb_foundation::{MbError, MbResult, Scalar};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// CSV 解析配置
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// 分隔符
    pub delimiter: char,
    /// 是否跳过无效行（否则报解析错误）
    pub skip_invalid: bool,
    /// 注释行前缀（以此开头的行将被跳过）
    pub comment_prefix: Option<char>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            skip_invalid: false,
            comment_prefix: Some('#'),
        }
    }
}

impl CsvOptions {
    /// 跳过无效行的宽松配置
    pub fn lenient() -> Self {
        Self {
            skip_invalid: true,
            ..Default::default()
        }
    }
}

/// 按列名索引的数值矩阵（首行表头，其余行为数值）
#[derive(Debug, Clone)]
pub struct NamedMatrix {
    headers: Vec<String>,
    /// 列名 → 列数据
    columns: BTreeMap<String, Vec<Scalar>>,
    /// 每列行数
    n_rows: usize,
    /// 来源路径（错误信息用）
    source: PathBuf,
}

impl NamedMatrix {
    /// 从文件加载
    pub fn load(path: &Path, options: &CsvOptions) -> MbResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MbError::io_with_source(format!("读取失败: {}", path.display()), e)
        })?;
        Self::parse_str(&content, options, Some(path))
    }

    /// 从字符串解析
    pub fn parse_str(
        content: &str,
        options: &CsvOptions,
        path: Option<&Path>,
    ) -> MbResult<Self> {
        let source = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("<string>"));

        let mut lines = content.lines().enumerate().filter(|(_, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            if let Some(prefix) = options.comment_prefix {
                if trimmed.starts_with(prefix) {
                    return false;
                }
            }
            true
        });

        let (_, header_line) = lines
            .next()
            .ok_or_else(|| MbError::parse(source.clone(), 0, "文件没有表头行"))?;
        let headers: Vec<String> = header_line
            .split(options.delimiter)
            .map(|h| h.trim().to_string())
            .collect();

        let mut columns: BTreeMap<String, Vec<Scalar>> =
            headers.iter().map(|h| (h.clone(), Vec::new())).collect();
        let mut n_rows = 0usize;

        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split(options.delimiter).map(str::trim).collect();
            if cells.len() != headers.len() {
                if options.skip_invalid {
                    continue;
                }
                return Err(MbError::parse(
                    source.clone(),
                    line_no + 1,
                    format!("列数不匹配: 期望{}, 实际{}", headers.len(), cells.len()),
                ));
            }

            let mut parsed = Vec::with_capacity(cells.len());
            let mut valid = true;
            for cell in &cells {
                match cell.parse::<Scalar>() {
                    Ok(v) => parsed.push(v),
                    Err(_) => {
                        valid = false;
                        break;
                    }
                }
            }
            if !valid {
                if options.skip_invalid {
                    continue;
                }
                return Err(MbError::parse(
                    source.clone(),
                    line_no + 1,
                    "数值解析失败".to_string(),
                ));
            }

            for (header, value) in headers.iter().zip(parsed) {
                columns.get_mut(header).unwrap().push(value);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(MbError::parse(source, 0, "没有有效数据行"));
        }

        Ok(Self {
            headers,
            columns,
            n_rows,
            source,
        })
    }

    /// 列名列表（按文件顺序）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 行数
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 按名取列；缺少必需列是致命错误
    pub fn column(&self, name: &str) -> MbResult<&[Scalar]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| MbError::missing_column(name, self.source.clone()))
    }

    /// 是否包含列
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// 文本键表：首列为字符串键（如分区名/日期），其余列为数值
#[derive(Debug, Clone)]
pub struct KeyedTable {
    /// 数值列名（不含键列）
    pub headers: Vec<String>,
    /// (键, 数值行)
    pub rows: Vec<(String, Vec<Scalar>)>,
}

impl KeyedTable {
    /// 从文件加载；`key_columns` 为行首的字符串键列数
    pub fn load(path: &Path, options: &CsvOptions, key_columns: usize) -> MbResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MbError::io_with_source(format!("读取失败: {}", path.display()), e)
        })?;
        Self::parse_str(&content, options, key_columns, Some(path))
    }

    /// 从字符串解析
    ///
    /// 多个键列以 `\t` 连接成一个键（调用方再拆分）。
    pub fn parse_str(
        content: &str,
        options: &CsvOptions,
        key_columns: usize,
        path: Option<&Path>,
    ) -> MbResult<Self> {
        let source = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("<string>"));

        let mut lines = content.lines().enumerate().filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && options
                    .comment_prefix
                    .map_or(true, |p| !trimmed.starts_with(p))
        });

        let (_, header_line) = lines
            .next()
            .ok_or_else(|| MbError::parse(source.clone(), 0, "文件没有表头行"))?;
        let all_headers: Vec<String> = header_line
            .split(options.delimiter)
            .map(|h| h.trim().to_string())
            .collect();
        if all_headers.len() <= key_columns {
            return Err(MbError::parse(source, 0, "表头缺少数值列"));
        }
        let headers = all_headers[key_columns..].to_vec();

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split(options.delimiter).map(str::trim).collect();
            if cells.len() != all_headers.len() {
                if options.skip_invalid {
                    continue;
                }
                return Err(MbError::parse(
                    source.clone(),
                    line_no + 1,
                    format!(
                        "列数不匹配: 期望{}, 实际{}",
                        all_headers.len(),
                        cells.len()
                    ),
                ));
            }
            let key = cells[..key_columns].join("\t");
            let mut values = Vec::with_capacity(headers.len());
            let mut valid = true;
            for cell in &cells[key_columns..] {
                match cell.parse::<Scalar>() {
                    Ok(v) => values.push(v),
                    Err(_) => {
                        valid = false;
                        break;
                    }
                }
            }
            if !valid {
                if options.skip_invalid {
                    continue;
                }
                return Err(MbError::parse(
                    source.clone(),
                    line_no + 1,
                    "数值解析失败".to_string(),
                ));
            }
            rows.push((key, values));
        }

        if rows.is_empty() {
            return Err(MbError::parse(source, 0, "没有有效数据行"));
        }

        Ok(Self { headers, rows })
    }

    /// 数值列索引
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_matrix_basic() {
        let content = "a,b\n1.0,2.0\n3.0,4.0\n";
        let matrix = NamedMatrix::parse_str(content, &CsvOptions::default(), None).unwrap();
        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.column("a").unwrap(), &[1.0, 3.0]);
        assert_eq!(matrix.column("b").unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn test_missing_column_fatal() {
        let content = "a,b\n1.0,2.0\n";
        let matrix = NamedMatrix::parse_str(content, &CsvOptions::default(), None).unwrap();
        assert!(matches!(
            matrix.column("c"),
            Err(MbError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_comment_and_blank_lines_skipped() {
        let content = "# 注释\na,b\n\n1.0,2.0\n# 又一条\n3.0,4.0\n";
        let matrix = NamedMatrix::parse_str(content, &CsvOptions::default(), None).unwrap();
        assert_eq!(matrix.n_rows(), 2);
    }

    #[test]
    fn test_invalid_row_strict() {
        let content = "a,b\n1.0,x\n";
        assert!(NamedMatrix::parse_str(content, &CsvOptions::default(), None).is_err());
    }

    #[test]
    fn test_invalid_row_lenient() {
        let content = "a,b\n1.0,x\n3.0,4.0\n";
        let matrix = NamedMatrix::parse_str(content, &CsvOptions::lenient(), None).unwrap();
        assert_eq!(matrix.n_rows(), 1);
        assert_eq!(matrix.column("a").unwrap(), &[3.0]);
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(NamedMatrix::parse_str("", &CsvOptions::default(), None).is_err());
        assert!(NamedMatrix::parse_str("a,b\n", &CsvOptions::default(), None).is_err());
    }

    #[test]
    fn test_keyed_table() {
        let content = "Zone,NH4,NO3\nArea1,0.5,1.5\nArea2,0.2,0.8\n";
        let table = KeyedTable::parse_str(content, &CsvOptions::default(), 1, None).unwrap();
        assert_eq!(table.headers, vec!["NH4", "NO3"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].0, "Area1");
        assert_eq!(table.rows[0].1, vec![0.5, 1.5]);
        assert_eq!(table.column_index("NO3"), Some(1));
    }

    #[test]
    fn test_keyed_table_two_keys() {
        let content = "date,Zone,NH4\n2020-01-01,Area1,0.5\n";
        let table = KeyedTable::parse_str(content, &CsvOptions::default(), 2, None).unwrap();
        assert_eq!(table.rows[0].0, "2020-01-01\tArea1");
        assert_eq!(table.rows[0].1, vec![0.5]);
    }
}
