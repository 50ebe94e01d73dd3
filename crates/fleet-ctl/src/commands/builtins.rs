use std::io::Write;

use fleet_model::components::BUILTINS;

pub fn execute<W>(out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    writeln!(out, "Found {} builtin components:", BUILTINS.len())?;
    for (i, name) in BUILTINS.iter().enumerate() {
        writeln!(out, " {:>2}. {name}", i + 1)?;
    }
    Ok(())
}
