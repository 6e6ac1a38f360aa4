use color_eyre::{Result, eyre::eyre};
use dui::dynamodb::{Backend, list_all_tables};

pub struct Options {
    pub json: bool,
}

pub async fn command(backend: &dyn Backend, options: Options) -> Result<()> {
    let table_names = list_all_tables(backend)
        .await
        .map_err(|err| eyre!("failed to list tables: {err}"))?;

    if options.json {
        println!("{}", serde_json::to_string(&table_names)?);
        return Ok(());
    }

    for table in table_names {
        println!("{}", table);
    }
    Ok(())
}
