use std::path::Path;

use publicizer::{
    metadata::accessibility::MemberAccess, publicize::count_non_public, walker::flatten_all,
    Module,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::load_module,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct TypeEntry {
    token: String,
    visibility: String,
    name: String,
    methods: usize,
    fields: usize,
    non_public_members: usize,
}

#[derive(Debug, Serialize)]
struct TypesOutput {
    module: String,
    types: Vec<TypeEntry>,
    count: usize,
}

pub fn run(
    path: &Path,
    namespace: Option<&str>,
    non_public_only: bool,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let module = load_module(path)?;
    let output = build_output(&module, namespace, non_public_only);

    print_output(&output, opts, |out| {
        let mut tw = TabWriter::new(&[
            ("Token", Align::Left),
            ("Visibility", Align::Left),
            ("Methods", Align::Right),
            ("Fields", Align::Right),
            ("Non-public", Align::Right),
            ("Name", Align::Left),
        ]);
        for e in &out.types {
            tw.row(vec![
                e.token.clone(),
                e.visibility.clone(),
                e.methods.to_string(),
                e.fields.to_string(),
                e.non_public_members.to_string(),
                e.name.clone(),
            ]);
        }
        tw.print();
        println!("\n{} type(s) listed in {}.", out.count, out.module);
    })
}

fn build_output(module: &Module, namespace: Option<&str>, non_public_only: bool) -> TypesOutput {
    let mut entries = Vec::new();
    for index in flatten_all(module) {
        let ty = &module[index];

        // nested types inherit the namespace of their outermost declaring type
        if let Some(ns) = namespace {
            let mut outer = index;
            while let Some(parent) = module[outer].enclosing {
                outer = parent;
            }
            if module[outer].namespace != ns {
                continue;
            }
        }

        if non_public_only && count_non_public(module, &[index]).is_empty() {
            continue;
        }

        entries.push(TypeEntry {
            token: ty.token.to_string(),
            visibility: ty.visibility().to_string(),
            name: module.full_name(index),
            methods: ty.methods.len(),
            fields: ty.fields.len(),
            non_public_members: ty
                .methods
                .iter()
                .chain(ty.fields.iter())
                .filter(|member| member.access() != MemberAccess::Public)
                .count(),
        });
    }

    TypesOutput {
        module: module.name().to_string(),
        count: entries.len(),
        types: entries,
    }
}
