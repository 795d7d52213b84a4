//! Static test-fixture catalog.
//!
//! The corpus is keyed by collection name (complexity tiers, error
//! handling, scalability, multilingual coverage) and consumed read-only.
//! A built-in corpus ships with the harness; an external catalog can be
//! loaded from JSON with the same shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::types::{Complexity, ExpectedValue, Language, TestCase};

/// Read-only catalog of test cases grouped into named collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCatalog {
    collections: BTreeMap<String, Vec<TestCase>>,
}

impl TestCatalog {
    /// Load a catalog from a JSON file mapping collection names to case
    /// arrays.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let collections: BTreeMap<String, Vec<TestCase>> = serde_json::from_str(&text)?;
        Ok(Self { collections })
    }

    /// Collection names in order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Cases of one collection, if it exists.
    pub fn collection(&self, name: &str) -> Option<&[TestCase]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    /// Every case across all collections, in collection order.
    pub fn all_cases(&self) -> Vec<&TestCase> {
        self.collections.values().flatten().collect()
    }

    /// Find a case by its identifier.
    pub fn find(&self, id: &str) -> Option<&TestCase> {
        self.collections.values().flatten().find(|c| c.id == id)
    }

    /// Corpus statistics, mirroring what interactive front-ends display.
    pub fn statistics(&self) -> CatalogStats {
        let mut by_collection = BTreeMap::new();
        let mut by_complexity = BTreeMap::new();
        let mut by_language = BTreeMap::new();
        let mut total = 0usize;

        for (name, cases) in &self.collections {
            by_collection.insert(name.clone(), cases.len());
            for case in cases {
                total += 1;
                *by_complexity
                    .entry(format!("{:?}", case.complexity).to_lowercase())
                    .or_insert(0) += 1;
                *by_language
                    .entry(format!("{:?}", Language::detect(&case.prompt)).to_lowercase())
                    .or_insert(0) += 1;
            }
        }

        CatalogStats {
            total,
            by_collection,
            by_complexity,
            by_language,
        }
    }

    /// The built-in fixture corpus.
    pub fn builtin() -> Self {
        let mut collections = BTreeMap::new();

        collections.insert("basic".to_string(), vec![
            TestCase::new("basic_001", "234を素因数分解してください", "single_function")
                .expecting_functions(["prime_factorization"])
                .expecting_result(ExpectedValue::List(vec![2, 3, 3, 13]))
                .with_complexity(Complexity::Basic),
            TestCase::new("basic_002", "[1, 2, 3, 4, 5]の合計を計算してください", "single_function")
                .expecting_functions(["sum"])
                .expecting_result(ExpectedValue::Int(15))
                .with_complexity(Complexity::Basic),
            TestCase::new("basic_003", "100は素数ですか？", "single_function")
                .expecting_functions(["is_prime"])
                .expecting_result(ExpectedValue::Bool(false))
                .with_complexity(Complexity::Basic),
            TestCase::new("basic_004", "5の階乗を計算してください", "single_function")
                .expecting_functions(["factorial"])
                .expecting_result(ExpectedValue::Int(120))
                .with_complexity(Complexity::Basic),
            TestCase::new("basic_005", "36の平方根を求めてください", "single_function")
                .expecting_functions(["square_root"])
                .expecting_result(ExpectedValue::Float(6.0))
                .with_complexity(Complexity::Basic),
        ]);

        collections.insert("intermediate".to_string(), vec![
            TestCase::new(
                "intermediate_001",
                "234を素因数分解し、その因数の総和を返してください",
                "two_step_sequential",
            )
            .expecting_functions(["prime_factorization", "sum"])
            .expecting_result(ExpectedValue::Int(21))
            .with_complexity(Complexity::Intermediate),
            TestCase::new(
                "intermediate_002",
                "12と18の最大公約数と最小公倍数を求めてください",
                "parallel_operations",
            )
            .expecting_functions(["gcd", "lcm"])
            .expecting_result(ExpectedValue::Map(BTreeMap::from([
                ("gcd".to_string(), 6.0),
                ("lcm".to_string(), 36.0),
            ])))
            .with_complexity(Complexity::Intermediate),
            TestCase::new(
                "intermediate_003",
                "2の10乗を計算し、その結果が素数かどうか判定してください",
                "sequential_dependent",
            )
            .expecting_functions(["power", "is_prime"])
            .expecting_result(ExpectedValue::Map(BTreeMap::from([
                ("power".to_string(), 1024.0),
                ("is_prime".to_string(), 0.0),
            ])))
            .with_complexity(Complexity::Intermediate),
            TestCase::new(
                "intermediate_004",
                "[10, 20, 30, 40, 50]の最大値、最小値、平均値を求めてください",
                "multiple_operations",
            )
            .expecting_functions(["max", "min", "average"])
            .expecting_result(ExpectedValue::Map(BTreeMap::from([
                ("max".to_string(), 50.0),
                ("min".to_string(), 10.0),
                ("average".to_string(), 30.0),
            ])))
            .with_complexity(Complexity::Intermediate),
            TestCase::new(
                "intermediate_005",
                "60を素因数分解し、その結果を掛け合わせて元の数を確認してください",
                "verification",
            )
            .expecting_functions(["prime_factorization", "multiply"])
            .with_complexity(Complexity::Intermediate),
        ]);

        collections.insert("advanced".to_string(), vec![
            TestCase::new(
                "advanced_001",
                "1から100までの素数をすべて見つけ、それらの合計、平均、最大値を求めてください",
                "batch_processing",
            )
            .expecting_functions(["is_prime", "sum", "average", "max"])
            .with_complexity(Complexity::Advanced),
            TestCase::new(
                "advanced_002",
                "フィボナッチ数列の最初の10項を生成し（1, 1, 2, 3, 5, 8, 13, 21, 34, 55）、各項が素数かどうか判定し、素数のみの合計を求めてください",
                "conditional_filtering",
            )
            .expecting_functions(["is_prime", "sum"])
            .expecting_result(ExpectedValue::Int(23))
            .with_complexity(Complexity::Advanced),
            TestCase::new(
                "advanced_003",
                "100の階乗を計算し、その桁数を求め、さらにその桁数の階乗を計算してください",
                "nested_operations",
            )
            .expecting_functions(["factorial"])
            .with_complexity(Complexity::Advanced),
            TestCase::new(
                "advanced_004",
                "24を素因数分解し、各因数のべき乗（2^2, 3^1）を計算し、それらの合計と積を求めてください",
                "mathematical_analysis",
            )
            .expecting_functions(["prime_factorization", "power", "sum", "multiply"])
            .with_complexity(Complexity::Advanced),
            TestCase::new(
                "advanced_005",
                "1から20の数字について、各数の約数の個数を求め、約数の個数が最大の数とその約数の個数を特定してください",
                "number_theory",
            )
            .expecting_functions(["prime_factorization", "max"])
            .with_complexity(Complexity::Advanced),
        ]);

        collections.insert("expert".to_string(), vec![
            TestCase::new(
                "expert_001",
                "100以下の完全数（自分自身を除く約数の和が自分自身と等しい数）をすべて見つけ、それらの素因数分解を行い、各完全数の素因数の種類数を求めてください",
                "advanced_number_theory",
            )
            .expecting_functions(["sum", "prime_factorization"])
            .with_complexity(Complexity::Expert),
            TestCase::new(
                "expert_002",
                "ユークリッドの互除法を使って120と90の最大公約数を求める過程をシミュレートし、各ステップでの余りを記録し、最終的にGCDを求めてください",
                "algorithm_simulation",
            )
            .expecting_functions(["modulo", "gcd"])
            .expecting_result(ExpectedValue::Int(30))
            .with_complexity(Complexity::Expert),
            TestCase::new(
                "expert_003",
                "カタラン数の最初の6項（1, 1, 2, 5, 14, 42）について、各項を階乗で表現できるかチェックし、素数である項の平方根を求めてください",
                "sequence_analysis",
            )
            .expecting_functions(["factorial", "is_prime", "square_root"])
            .with_complexity(Complexity::Expert),
        ]);

        collections.insert("clear_prompts".to_string(), vec![
            TestCase::new("clear_001", "prime_factorization(456)を実行してください", "explicit_function_call")
                .expecting_functions(["prime_factorization"])
                .expecting_result(ExpectedValue::List(vec![2, 2, 2, 3, 19])),
            TestCase::new("clear_002", "リスト[7, 14, 21, 28]のsum()を計算してください", "explicit_function_call")
                .expecting_functions(["sum"])
                .expecting_result(ExpectedValue::Int(70)),
        ]);

        collections.insert("ambiguous_prompts".to_string(), vec![
            TestCase::new("ambiguous_001", "456を分析してください", "implicit_intent")
                .expecting_functions(["prime_factorization"]),
            TestCase::new(
                "ambiguous_002",
                "これらの数字を処理してください: [7, 14, 21, 28]",
                "multiple_interpretations",
            )
            .expecting_functions(["sum", "max", "min", "average"]),
            TestCase::new("ambiguous_003", "100について教えてください", "open_ended_analysis")
                .expecting_functions(["prime_factorization", "is_prime", "square_root"]),
        ]);

        collections.insert("sequential_operations".to_string(), vec![
            TestCase::new(
                "sequential_001",
                "まず84を素因数分解してください。次に、得られた因数の合計を計算してください。最後に、その合計値の平方根を求めてください。",
                "explicit_sequence",
            )
            .expecting_functions(["prime_factorization", "sum", "square_root"]),
            TestCase::new(
                "sequential_002",
                "72の約数の個数を求めたいです。そのために72を素因数分解し、各素因数の指数を使って約数の個数の公式を適用してください。",
                "mathematical_reasoning",
            )
            .expecting_functions(["prime_factorization"]),
        ]);

        collections.insert("conditional_operations".to_string(), vec![
            TestCase::new(
                "conditional_001",
                "数値Nを入力として、Nが素数なら1を返し、そうでなければNを素因数分解した結果を返してください。N=97で試してください。",
                "conditional_logic",
            )
            .expecting_functions(["is_prime"])
            .expecting_result(ExpectedValue::Int(1)),
            TestCase::new(
                "conditional_002",
                "数値Mについて、Mが完全平方数なら平方根を返し、そうでなければMの絶対値を返してください。M=144で試してください。",
                "conditional_logic",
            )
            .expecting_functions(["square_root"])
            .expecting_result(ExpectedValue::Float(12.0)),
        ]);

        collections.insert("invalid_input".to_string(), vec![
            TestCase::new("error_001", "負の数 -5 の階乗を計算してください", "negative_input_error")
                .expecting_error("ArgumentException"),
            TestCase::new("error_002", "0で割り算をしてください: 10 ÷ 0", "division_by_zero")
                .expecting_error("ArgumentException"),
            TestCase::new("error_003", "負の数 -16 の平方根を計算してください", "invalid_sqrt")
                .expecting_error("ArgumentException"),
            TestCase::new(
                "error_004",
                "25の階乗を計算してください（オーバーフロー発生）",
                "overflow_error",
            )
            .expecting_error("ArgumentException"),
        ]);

        collections.insert("edge_case".to_string(), vec![
            TestCase::new("edge_001", "1を素因数分解してください", "boundary_condition")
                .expecting_error("ArgumentException"),
            TestCase::new("edge_002", "空のリスト[]の合計を計算してください", "empty_input")
                .expecting_functions(["sum"])
                .expecting_result(ExpectedValue::Int(0)),
            TestCase::new("edge_003", "0の階乗を計算してください", "special_case")
                .expecting_functions(["factorial"])
                .expecting_result(ExpectedValue::Int(1)),
        ]);

        collections.insert("large_number".to_string(), vec![
            TestCase::new("scale_001", "1000000を素因数分解してください", "large_input")
                .expecting_functions(["prime_factorization"])
                .expecting_result(ExpectedValue::List(vec![2, 2, 2, 2, 2, 2, 5, 5, 5, 5, 5, 5])),
            TestCase::new("scale_002", "1から1000までの数の合計を計算してください", "large_range")
                .expecting_functions(["sum"])
                .expecting_result(ExpectedValue::Int(500_500)),
            TestCase::new("scale_003", "20の階乗（上限値）を計算してください", "boundary_performance")
                .expecting_functions(["factorial"])
                .expecting_result(ExpectedValue::Int(2_432_902_008_176_640_000)),
        ]);

        collections.insert("multiple_operations".to_string(), vec![
            TestCase::new(
                "multi_001",
                "次の10個の数を同時に処理してください: [12, 15, 18, 20, 24, 30, 36, 40, 45, 60] - 各数を素因数分解し、それぞれの因数の合計を求め、全体の統計（最大、最小、平均）を出してください",
                "batch_processing",
            )
            .expecting_functions(["prime_factorization", "sum", "max", "min", "average"]),
        ]);

        collections.insert("japanese".to_string(), vec![
            TestCase::new("jp_001", "九十九を素因数分解してください", "japanese_numbers")
                .expecting_functions(["prime_factorization"])
                .expecting_result(ExpectedValue::List(vec![3, 3, 11])),
            TestCase::new("jp_002", "階乗の計算：六の階乗を求めてください", "japanese_numbers")
                .expecting_functions(["factorial"])
                .expecting_result(ExpectedValue::Int(720)),
        ]);

        collections.insert("english".to_string(), vec![
            TestCase::new(
                "en_001",
                "Calculate the prime factorization of two hundred and fifty-six",
                "english_numbers",
            )
            .expecting_functions(["prime_factorization"])
            .expecting_result(ExpectedValue::List(vec![2, 2, 2, 2, 2, 2, 2, 2])),
            TestCase::new(
                "en_002",
                "Find the greatest common divisor of forty-eight and sixty-four",
                "english_numbers",
            )
            .expecting_functions(["gcd"])
            .expecting_result(ExpectedValue::Int(16)),
        ]);

        collections.insert("mixed_language".to_string(), vec![
            TestCase::new(
                "mixed_001",
                "Calculate 百二十八 (128) の prime factorization をしてください",
                "mixed_language",
            )
            .expecting_functions(["prime_factorization"])
            .expecting_result(ExpectedValue::List(vec![2, 2, 2, 2, 2, 2, 2])),
        ]);

        collections.insert("precision".to_string(), vec![
            TestCase::new(
                "precision_001",
                "2の平方根の精度を小数点以下10桁まで確認してください",
                "floating_point_precision",
            )
            .expecting_functions(["square_root"])
            .expecting_result(ExpectedValue::Float(1.414_213_562_373_095_1)),
            TestCase::new(
                "precision_002",
                "非常に大きな数での除算: 999999999 ÷ 3333333 の精度を確認してください",
                "large_number_division",
            )
            .expecting_functions(["divide"])
            .expecting_result(ExpectedValue::Float(300.000_000_300_000_1)),
        ]);

        collections.insert("verification".to_string(), vec![
            TestCase::new(
                "verify_001",
                "ゴールドバッハ予想の検証：20を二つの素数の和で表してください（素数判定を使用）",
                "mathematical_conjecture",
            )
            .expecting_functions(["is_prime", "sum"]),
            TestCase::new(
                "verify_002",
                "ピタゴラス数の検証：3²+4²=5²を計算で確認してください",
                "theorem_verification",
            )
            .expecting_functions(["power", "sum"]),
        ]);

        Self { collections }
    }
}

/// Corpus-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total: usize,
    pub by_collection: BTreeMap<String, usize>,
    pub by_complexity: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
}
