use anyhow::{Context, Result};
use snmp2::{AsyncSession, Oid, Value};

use super::value::render_value;

pub struct SnmpClientV2c {
    pub(crate) session: AsyncSession,
}

impl SnmpClientV2c {
    pub async fn new(target: &str, community: &[u8]) -> Result<Self> {
        let session = AsyncSession::new_v2c(target, community, 2)
            .await
            .context("Не удалось создать SNMP сессию")?;

        Ok(Self { session })
    }

    /// GET одного экземпляра; `None`, если объекта на устройстве нет
    pub async fn get(&mut self, oid: &Oid<'_>) -> Result<Option<String>> {
        let resp = self
            .session
            .get(oid)
            .await
            .context("SNMP GET запрос не удался")?;

        let (_, value) = resp
            .varbinds
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("SNMP ответ пустой"))?;

        Ok(render_value(&value))
    }

    /// Обход поддерева через GETBULK, значения в порядке строк устройства
    pub async fn walk(
        &mut self,
        start_oid: &Oid<'_>,
        max_repetitions: u32,
        limit: usize,
    ) -> Result<Vec<(String, String)>> {
        let mut results: Vec<(String, String)> = Vec::new();
        let mut current_oid = start_oid.to_owned();

        'walk: loop {
            let resp = self
                .session
                .getbulk(&[&current_oid], 0, max_repetitions)
                .await
                .context("SNMP GETBULK запрос не удался")?;

            let mut advanced = false;

            for (oid, value) in resp.varbinds {
                if !oid.starts_with(start_oid) || matches!(value, Value::EndOfMibView) {
                    break 'walk;
                }
                // Агент вернул тот же OID: дальше обход не сдвинется
                if oid == current_oid {
                    break 'walk;
                }

                if let Some(value) = render_value(&value) {
                    results.push((oid.to_string(), value));
                    if results.len() >= limit {
                        break 'walk;
                    }
                }
                current_oid = oid.to_owned();
                advanced = true;
            }

            if !advanced {
                break;
            }
        }

        Ok(results)
    }
}
