//! Builds a [`Module`] from a PE image.
//!
//! The loader walks CLR header → metadata root → table stream, decodes every `TypeDef` row
//! with its method and field lists (following `FieldPtr`/`MethodPtr` when present), and builds
//! the nesting tree from `NestedClass`. Every structural inconsistency that would make the
//! tree ambiguous is rejected as [`crate::Error::Malformed`].

use std::ops::Range;

use log::debug;

use crate::{
    file::{parser::Parser, File},
    metadata::{
        accessibility::TypeVisibility,
        cor20header::{Cor20Header, COR20_HEADER_SIZE},
        root::Root,
        streams::{Strings, TablesHeader},
        tables::{Column, TableId},
        token::Token,
    },
    module::{MemberDef, Module, TypeDef, TypeIndex},
    Result,
};

/// Absolute view of the table stream inside the image.
struct Tables<'a> {
    header: TablesHeader,
    data: &'a [u8],
    base: usize,
}

impl<'a> Tables<'a> {
    /// Returns a parser positioned at `row` of `table`, and the absolute offset of that row.
    fn row(&self, table: TableId, row: u32) -> Result<(Parser<'a>, usize)> {
        let offset = self.header.row_offset(table, row)?;
        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;

        Ok((parser, self.base + offset))
    }

    fn read_column(&self, parser: &mut Parser<'_>, column: Column) -> Result<u32> {
        match self.header.info.column_size(column) {
            1 => Ok(u32::from(parser.read_le::<u8>()?)),
            size => parser.read_index(size == 4),
        }
    }

    fn skip_column(&self, parser: &mut Parser<'_>, column: Column) -> Result<()> {
        parser.advance_by(usize::from(self.header.info.column_size(column)))
    }
}

pub(crate) fn load(file: File) -> Result<Module> {
    let (clr_rva, clr_size) = file.clr();
    if (clr_size as usize) < COR20_HEADER_SIZE {
        return Err(malformed_error!(
            "CLR runtime header directory too small - {}",
            clr_size
        ));
    }

    let clr_offset = file.rva_to_offset(clr_rva as usize)?;
    let cor20 = Cor20Header::read(file.data_slice(clr_offset, COR20_HEADER_SIZE)?)?;

    let metadata_offset = file.rva_to_offset(cor20.meta_data_rva as usize)?;
    let metadata = file.data_slice(metadata_offset, cor20.meta_data_size as usize)?;
    let root = Root::read(metadata)?;

    let Some(tables_stream) = root.stream("#~").or_else(|| root.stream("#-")) else {
        return Err(malformed_error!("Metadata has no #~ or #- stream"));
    };
    let Some(strings_stream) = root.stream("#Strings") else {
        return Err(malformed_error!("Metadata has no #Strings stream"));
    };

    let strings_range = stream_range(strings_stream.offset, strings_stream.size);
    let strings = Strings::from(&metadata[strings_range])?;

    let tables_range = stream_range(tables_stream.offset, tables_stream.size);
    let tables_base = metadata_offset + tables_range.start;
    let tables_data = &metadata[tables_range];
    let tables = Tables {
        header: TablesHeader::from(tables_data)?,
        data: tables_data,
        base: tables_base,
    };

    debug!(
        "Metadata {} with stream {} ({} tables, heap sizes 0x{:02x})",
        root.version,
        tables_stream.name,
        tables.header.table_count(),
        tables.header.heap_sizes
    );

    let name = module_name(&tables, &strings)?;
    let mut types = load_types(&tables, &strings)?;
    let roots = build_tree(&tables, &mut types)?;

    debug!(
        "Loaded {} types ({} top-level) from module '{}'",
        types.len(),
        roots.len(),
        name
    );

    Ok(Module {
        file,
        name,
        runtime_version: root.version,
        types,
        roots,
    })
}

/// `Root::read` guarantees `offset + size` lies within the metadata.
fn stream_range(offset: u32, size: u32) -> Range<usize> {
    let start = offset as usize;
    start..start + size as usize
}

fn module_name(tables: &Tables<'_>, strings: &Strings<'_>) -> Result<String> {
    if !tables.header.has_table(TableId::Module) {
        return Ok(String::new());
    }

    let (mut parser, _) = tables.row(TableId::Module, 1)?;
    parser.advance_by(2)?;
    let name = tables.read_column(&mut parser, Column::Str)?;

    Ok(strings.get(name as usize)?.into_owned())
}

/// The columns of a `TypeDef` row the loader needs.
struct TypeDefRaw {
    rid: u32,
    flags: u32,
    type_name: u32,
    type_namespace: u32,
    field_list: u32,
    method_list: u32,
    flags_offset: usize,
}

impl TypeDefRaw {
    fn read(tables: &Tables<'_>, rid: u32) -> Result<TypeDefRaw> {
        let (mut parser, flags_offset) = tables.row(TableId::TypeDef, rid)?;

        let flags = parser.read_le::<u32>()?;
        let type_name = tables.read_column(&mut parser, Column::Str)?;
        let type_namespace = tables.read_column(&mut parser, Column::Str)?;
        tables.skip_column(&mut parser, TableId::TypeDef.columns()[3])?;
        let field_list = tables.read_column(&mut parser, Column::Table(TableId::Field))?;
        let method_list = tables.read_column(&mut parser, Column::Table(TableId::MethodDef))?;

        Ok(TypeDefRaw {
            rid,
            flags,
            type_name,
            type_namespace,
            field_list,
            method_list,
            flags_offset,
        })
    }
}

fn load_types(tables: &Tables<'_>, strings: &Strings<'_>) -> Result<Vec<TypeDef>> {
    let type_count = tables.header.row_count(TableId::TypeDef);

    let mut rows = Vec::with_capacity(type_count as usize);
    for rid in 1..=type_count {
        rows.push(TypeDefRaw::read(tables, rid)?);
    }

    let field_lists: Vec<u32> = rows.iter().map(|raw| raw.field_list).collect();
    let method_lists: Vec<u32> = rows.iter().map(|raw| raw.method_list).collect();

    let mut types = Vec::with_capacity(rows.len());
    for (position, raw) in rows.into_iter().enumerate() {
        let field_range = member_range(
            tables,
            TableId::FieldPtr,
            TableId::Field,
            &field_lists,
            position,
        )?;
        let method_range = member_range(
            tables,
            TableId::MethodPtr,
            TableId::MethodDef,
            &method_lists,
            position,
        )?;

        let mut fields = Vec::with_capacity(field_range.len());
        for logical in field_range {
            fields.push(load_member(
                tables,
                strings,
                TableId::FieldPtr,
                TableId::Field,
                logical,
            )?);
        }

        let mut methods = Vec::with_capacity(method_range.len());
        for logical in method_range {
            methods.push(load_member(
                tables,
                strings,
                TableId::MethodPtr,
                TableId::MethodDef,
                logical,
            )?);
        }

        types.push(TypeDef {
            token: Token::from_parts(TableId::TypeDef as u8, raw.rid),
            name: strings.get(raw.type_name as usize)?.into_owned(),
            namespace: strings.get(raw.type_namespace as usize)?.into_owned(),
            enclosing: None,
            nested: Vec::new(),
            methods,
            fields,
            visibility: TypeVisibility::from_flags(raw.flags),
            flags: raw.flags,
            flags_offset: raw.flags_offset,
        });
    }

    Ok(types)
}

/// Resolves the logical member range owned by the type at `position`.
///
/// A list runs from its own start to the next type's start, or to the end of the list table
/// for the last type. The list table is the pointer table when present.
fn member_range(
    tables: &Tables<'_>,
    pointer: TableId,
    target: TableId,
    starts: &[u32],
    position: usize,
) -> Result<Range<u32>> {
    let list_table = if tables.header.has_table(pointer) {
        pointer
    } else {
        target
    };
    let end_of_table = tables.header.row_count(list_table) + 1;

    let start = starts[position];
    let end = starts.get(position + 1).copied().unwrap_or(end_of_table);

    if start == 0 || start > end_of_table || end > end_of_table {
        return Err(malformed_error!(
            "{:?} list of TypeDef row {} out of range - {}..{}",
            target,
            position + 1,
            start,
            end
        ));
    }
    if end < start {
        return Err(malformed_error!(
            "{:?} lists are not ascending at TypeDef row {} - {} > {}",
            target,
            position + 2,
            start,
            end
        ));
    }

    Ok(start..end)
}

fn load_member(
    tables: &Tables<'_>,
    strings: &Strings<'_>,
    pointer: TableId,
    target: TableId,
    logical: u32,
) -> Result<MemberDef> {
    let row = if tables.header.has_table(pointer) {
        let (mut parser, _) = tables.row(pointer, logical)?;
        tables.read_column(&mut parser, Column::Table(target))?
    } else {
        logical
    };

    if row == 0 || row > tables.header.row_count(target) {
        return Err(malformed_error!(
            "{:?} row {} referenced through {:?} does not exist",
            target,
            row,
            pointer
        ));
    }

    let (mut parser, row_offset) = tables.row(target, row)?;
    let flags_column = if target == TableId::MethodDef {
        // RVA (4) + ImplFlags (2)
        parser.advance_by(6)?;
        6
    } else {
        0
    };

    let flags = parser.read_le::<u16>()?;
    let name = tables.read_column(&mut parser, Column::Str)?;

    MemberDef::new(
        Token::from_parts(target as u8, row),
        strings.get(name as usize)?.into_owned(),
        flags,
        row_offset + flags_column,
    )
}

/// Links nested types to their enclosing types and returns the top-level types.
fn build_tree(tables: &Tables<'_>, types: &mut [TypeDef]) -> Result<Vec<TypeIndex>> {
    let type_count = types.len();

    let mut pairs = Vec::new();
    if tables.header.has_table(TableId::NestedClass) {
        for row in 1..=tables.header.row_count(TableId::NestedClass) {
            let (mut parser, _) = tables.row(TableId::NestedClass, row)?;
            let nested = tables.read_column(&mut parser, Column::Table(TableId::TypeDef))?;
            let enclosing = tables.read_column(&mut parser, Column::Table(TableId::TypeDef))?;

            for value in [nested, enclosing] {
                if value == 0 || value as usize > type_count {
                    return Err(malformed_error!(
                        "NestedClass row {} references missing TypeDef row {}",
                        row,
                        value
                    ));
                }
            }
            if nested == enclosing {
                return Err(malformed_error!(
                    "TypeDef row {} is nested inside itself",
                    nested
                ));
            }

            pairs.push((nested as usize - 1, enclosing as usize - 1));
        }
    }

    pairs.sort_unstable();
    for (nested, enclosing) in &pairs {
        if types[*nested].enclosing.is_some() {
            return Err(malformed_error!(
                "TypeDef row {} has more than one enclosing type",
                nested + 1
            ));
        }

        types[*nested].enclosing = Some(TypeIndex(*enclosing));
        types[*enclosing].nested.push(TypeIndex(*nested));
    }

    let roots: Vec<TypeIndex> = (0..type_count)
        .filter(|position| types[*position].enclosing.is_none())
        .map(TypeIndex)
        .collect();

    // Every type has at most one parent; any type not reachable from a root sits on a cycle.
    let mut reached = 0_usize;
    let mut stack = roots.clone();
    while let Some(current) = stack.pop() {
        reached += 1;
        stack.extend(types[current.0].nested.iter().copied());
    }

    if reached != type_count {
        return Err(malformed_error!(
            "Nested types form a cycle - {} of {} types reachable",
            reached,
            type_count
        ));
    }

    Ok(roots)
}

#[cfg(test)]
mod tests {
    use crate::{
        metadata::accessibility::MemberAccess,
        test::{member_flags, sample_metadata, type_flags, ImageBuilder, MetadataBuilder},
        Error, Module,
    };

    fn load(meta: MetadataBuilder) -> crate::Result<Module> {
        Module::from_mem(ImageBuilder::new().metadata(meta).build())
    }

    fn member_names(module: &Module) -> Vec<String> {
        module
            .types()
            .flat_map(|(_, ty)| {
                ty.methods
                    .iter()
                    .chain(ty.fields.iter())
                    .map(|member| format!("{}::{}", ty.name, member.name))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn pointer_tables() {
        let plain = load(sample_metadata()).unwrap();
        let indirect = load(sample_metadata().pointer_tables(true)).unwrap();

        assert_eq!(member_names(&plain), member_names(&indirect));

        let player = indirect.roots()[1];
        // the first logical method is stored in the last physical row
        assert_eq!(indirect[player].methods[0].name, "Update");
        assert_eq!(indirect[player].methods[0].token.row(), 5);
        assert_eq!(indirect[player].fields[0].token.row(), 6);
        assert_eq!(indirect[player].methods[0].access(), MemberAccess::Private);
    }

    #[test]
    fn uncompressed_stream_with_extra_data() {
        let module = load(sample_metadata().uncompressed(true)).unwrap();
        assert_eq!(module.type_count(), 5);
        assert_eq!(member_names(&module), member_names(&load(sample_metadata()).unwrap()));
    }

    #[test]
    fn large_string_indexes_and_leading_tables() {
        let meta = sample_metadata()
            .large_strings(true)
            .type_refs(3)
            .custom_attributes(2);
        let module = load(meta).unwrap();

        assert_eq!(module.full_name(module.roots()[1]), "Game.Player");
        assert_eq!(member_names(&module), member_names(&load(sample_metadata()).unwrap()));
    }

    #[test]
    fn pe32_plus_image() {
        let image = ImageBuilder::new()
            .pe32_plus(true)
            .metadata(sample_metadata())
            .build();
        let module = Module::from_mem(image).unwrap();
        assert_eq!(module.type_count(), 5);
    }

    #[test]
    fn reserved_member_access() {
        let mut meta = MetadataBuilder::new();
        let ty = meta.add_type("Bad", "Type", type_flags::PUBLIC);
        meta.add_method(ty, "Broken", 0x0007);

        assert!(matches!(load(meta), Err(Error::InvalidAccess(7))));
    }

    #[test]
    fn nesting_cycle() {
        let mut meta = MetadataBuilder::new();
        let a = meta.add_type("", "A", type_flags::NESTED_PRIVATE);
        let b = meta.add_type("", "B", type_flags::NESTED_PRIVATE);
        meta.nest(a, b);
        meta.nest(b, a);

        assert!(matches!(load(meta), Err(Error::Malformed { .. })));
    }

    #[test]
    fn self_nesting() {
        let mut meta = MetadataBuilder::new();
        let a = meta.add_type("", "A", type_flags::NESTED_PRIVATE);
        meta.nest(a, a);

        assert!(matches!(load(meta), Err(Error::Malformed { .. })));
    }

    #[test]
    fn two_enclosing_types() {
        let mut meta = MetadataBuilder::new();
        let outer1 = meta.add_type("N", "Outer1", type_flags::PUBLIC);
        let outer2 = meta.add_type("N", "Outer2", type_flags::PUBLIC);
        let inner = meta.add_nested_type(outer1, "Inner", type_flags::NESTED_PUBLIC);
        meta.nest(inner, outer2);

        assert!(matches!(load(meta), Err(Error::Malformed { .. })));
    }

    #[test]
    fn nested_order_follows_declaration() {
        let mut meta = MetadataBuilder::new();
        let outer = meta.add_type("N", "Outer", type_flags::PUBLIC);
        let second = meta.add_type("", "Second", type_flags::NESTED_PRIVATE);
        let first = meta.add_type("", "First", type_flags::NESTED_PRIVATE);
        meta.nest(first, outer);
        meta.nest(second, outer);
        meta.add_field(outer, "x", member_flags::PRIVATE);

        let module = load(meta).unwrap();
        let outer = module.roots()[1];
        let names: Vec<&str> = module[outer]
            .nested
            .iter()
            .map(|index| module[*index].name.as_str())
            .collect();
        assert_eq!(names, ["Second", "First"]);
    }

    #[test]
    fn truncated_image() {
        let image = ImageBuilder::new().metadata(sample_metadata()).build();
        let truncated = image[..0x260].to_vec();
        assert!(Module::from_mem(truncated).is_err());
    }

    #[test]
    fn invalid_utf8_names_load() {
        let mut image = ImageBuilder::new().metadata(sample_metadata()).build();
        let position = image
            .windows(7)
            .position(|window| window == b"Update\0")
            .unwrap();
        image[position] = 0xFF;

        let module = Module::from_mem(image).unwrap();
        let player = module.roots()[1];
        assert_eq!(module[player].methods[0].name, "\u{FFFD}pdate");
        assert_eq!(module[player].methods[0].access(), MemberAccess::Private);
    }

    #[test]
    fn corrupted_metadata_signature() {
        let mut image = ImageBuilder::new().metadata(sample_metadata()).build();
        // metadata root starts right after the 72-byte COR20 header at file offset 0x200
        image[0x248] = b'X';
        assert!(matches!(
            Module::from_mem(image),
            Err(Error::Malformed { .. })
        ));
    }
}
