/// Строка таблицы: i-е значения всех колонок и её индекс (с 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: usize,
    pub values: Vec<String>,
}

/// Склеивает параллельные колонки по позиции.
///
/// Длина результата равна самой короткой колонке: если устройство отдало
/// одну колонку короче других, строк просто меньше, ошибкой это не считается.
pub fn correlate(columns: Vec<Vec<String>>) -> Vec<Row> {
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut columns: Vec<_> = columns.into_iter().map(Vec::into_iter).collect();

    (1..=rows)
        .map(|index| Row {
            index,
            values: columns.iter_mut().filter_map(Iterator::next).collect(),
        })
        .collect()
}
